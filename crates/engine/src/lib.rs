//! Notification dispatch engine.
//!
//! request → `PlanBuilder` → `FanOutExecutor` → `OutcomeAggregator` → `RecordStore`

pub mod aggregator;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod lookup;
pub mod plan;
pub mod store;

pub use dispatcher::{DispatchEngine, DispatchReport};
pub use error::DispatchError;
