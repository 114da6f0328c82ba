//! Shared application state for the Axum API server.

use std::sync::Arc;

use deadsync_engine::DispatchEngine;
use deadsync_engine::store::RecordStore;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DispatchEngine>,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(engine: DispatchEngine) -> Self {
        let store = Arc::clone(engine.store());
        Self {
            engine: Arc::new(engine),
            store,
        }
    }
}
