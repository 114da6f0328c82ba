//! Dispatch entry point.
//!
//! Steps:
//! 1. Build and validate the plan (no side effects on failure)
//! 2. Create the `pending` record (abort before any channel on failure)
//! 3. Fan out to every channel and wait for all outcomes
//! 4. Aggregate, persist per-channel rows, finalize the record
//!
//! Steps 3 and 4 run on a spawned task and finish even if the caller goes away.
//!
//! Failures in step 4 are logged and reported through `persisted`, never
//! returned: the caller always receives the in-memory result.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use deadsync_common::types::{
    ChannelDelivery, ChannelKind, ChannelOutcome, DeliveryStatus, NotificationRecord,
    NotificationRequest,
};

use crate::aggregator::OutcomeAggregator;
use crate::error::DispatchError;
use crate::executor::FanOutExecutor;
use crate::plan::{DispatchTask, PlanBuilder};
use crate::store::RecordStore;

/// Synchronous result of one dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub notification_id: Uuid,
    pub status: DeliveryStatus,
    pub sent_at: Option<DateTime<Utc>>,
    /// One entry per attempted channel, in priority order.
    pub outcomes: Vec<ChannelOutcome>,
    /// False when the terminal status could not be written; the stored
    /// record is then still `pending`.
    pub persisted: bool,
}

impl DispatchReport {
    /// Channel → success map, e.g. `{email: true, push: false}`.
    pub fn channel_results(&self) -> BTreeMap<ChannelKind, bool> {
        self.outcomes.iter().map(|o| (o.channel, o.success)).collect()
    }

    pub fn outcome(&self, channel: ChannelKind) -> Option<&ChannelOutcome> {
        self.outcomes.iter().find(|o| o.channel == channel)
    }
}

pub struct DispatchEngine {
    executor: Arc<FanOutExecutor>,
    store: Arc<dyn RecordStore>,
}

impl DispatchEngine {
    pub fn new(executor: FanOutExecutor, store: Arc<dyn RecordStore>) -> Self {
        Self {
            executor: Arc::new(executor),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn configured_channels(&self) -> Vec<ChannelKind> {
        self.executor.configured_channels()
    }

    /// Deliver `request` across its channels and record the aggregate status.
    ///
    /// Once the pending record exists the rest of the dispatch runs on its own
    /// task, so dropping the returned future does not leave the record pending.
    pub async fn dispatch(
        &self,
        request: &NotificationRequest,
    ) -> Result<DispatchReport, DispatchError> {
        let plan = PlanBuilder::build(request)?;

        let record = NotificationRecord::pending(
            request,
            plan.user_id,
            &plan.notification_type,
            &plan.recipient,
            &plan.channels,
            Utc::now(),
        );
        let notification_id = record.id;

        if let Err(e) = self.store.create(&record).await {
            tracing::error!(
                notification_id = %notification_id,
                error = %e,
                "Failed to create notification record, no channel attempted"
            );
            return Err(e.into());
        }

        tracing::debug!(
            notification_id = %notification_id,
            channels = %record.channels,
            "Dispatching notification"
        );

        let run = DispatchRun {
            notification_id,
            executor: Arc::clone(&self.executor),
            store: Arc::clone(&self.store),
        };
        tokio::spawn(run.complete(plan.tasks))
            .await
            .map_err(|e| {
                tracing::error!(
                    notification_id = %notification_id,
                    error = %e,
                    "Dispatch task aborted, record left pending"
                );
                DispatchError::Aborted(e.to_string())
            })
    }
}

/// Fan-out and finalization for one created record, owned by a spawned task.
struct DispatchRun {
    notification_id: Uuid,
    executor: Arc<FanOutExecutor>,
    store: Arc<dyn RecordStore>,
}

impl DispatchRun {
    async fn complete(self, tasks: Vec<DispatchTask>) -> DispatchReport {
        let notification_id = self.notification_id;

        let mut outcomes = self.executor.execute(tasks).await;
        outcomes.sort_by_key(|o| o.channel);

        let completed_at = Utc::now();
        let aggregate = OutcomeAggregator::aggregate(&outcomes, completed_at);

        let deliveries: Vec<ChannelDelivery> = outcomes
            .iter()
            .map(|o| ChannelDelivery::from_outcome(notification_id, o, completed_at))
            .collect();
        if let Err(e) = self.store.record_outcomes(notification_id, &deliveries).await {
            tracing::warn!(
                notification_id = %notification_id,
                error = %e,
                "Failed to persist per-channel outcomes"
            );
        }

        let persisted = match self
            .store
            .update_status(notification_id, aggregate.status, aggregate.sent_at)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    notification_id = %notification_id,
                    status = %aggregate.status,
                    error = %e,
                    "Failed to finalize notification record, left pending"
                );
                false
            }
        };

        let delivered = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            notification_id = %notification_id,
            status = %aggregate.status,
            delivered,
            attempted = outcomes.len(),
            persisted,
            "Notification dispatched"
        );

        DispatchReport {
            notification_id,
            status: aggregate.status,
            sent_at: aggregate.sent_at,
            outcomes,
            persisted,
        }
    }
}
