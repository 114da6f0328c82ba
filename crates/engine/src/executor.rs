//! Fan-out executor.
//!
//! Runs every dispatch task as its own tokio task and waits for all of them.
//! Each channel resolves to exactly one `ChannelOutcome`:
//! 1. Resolve channel preconditions (deadline for calendar, device token for push)
//! 2. Look up the adapter; a missing one is `not_implemented`
//! 3. Call the adapter, bounded by the optional per-channel timeout
//!
//! Adapter errors, lookup errors, timeouts and panics all become failed
//! outcomes. Nothing escapes to the caller.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use deadsync_common::types::{ChannelKind, ChannelOutcome, OutboundMessage};
use deadsync_notifier::{ChannelAdapter, ChannelError, ChannelRegistry};

use crate::lookup::{DeadlineLookup, DeviceTokenLookup};
use crate::plan::DispatchTask;

pub struct FanOutExecutor {
    adapters: ChannelRegistry,
    deadlines: Arc<dyn DeadlineLookup>,
    device_tokens: Arc<dyn DeviceTokenLookup>,
    channel_timeout: Option<Duration>,
}

impl FanOutExecutor {
    pub fn new(
        adapters: ChannelRegistry,
        deadlines: Arc<dyn DeadlineLookup>,
        device_tokens: Arc<dyn DeviceTokenLookup>,
    ) -> Self {
        Self {
            adapters,
            deadlines,
            device_tokens,
            channel_timeout: None,
        }
    }

    /// Channels with an adapter, in priority order.
    pub fn configured_channels(&self) -> Vec<ChannelKind> {
        self.adapters.configured()
    }

    /// Bound every channel attempt by `timeout`. `None` leaves attempts unbounded.
    pub fn with_channel_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.channel_timeout = timeout;
        self
    }

    /// Attempt every task concurrently. Returns one outcome per task.
    ///
    /// Spawned attempts are not cancelled if the returned future is dropped.
    pub async fn execute(&self, tasks: Vec<DispatchTask>) -> Vec<ChannelOutcome> {
        let (channels, handles): (Vec<ChannelKind>, Vec<_>) = tasks
            .into_iter()
            .map(|task| {
                let attempt = ChannelAttempt {
                    adapter: self.adapters.get(task.channel),
                    deadlines: Arc::clone(&self.deadlines),
                    device_tokens: Arc::clone(&self.device_tokens),
                    timeout: self.channel_timeout,
                };
                (task.channel, tokio::spawn(attempt.run(task)))
            })
            .unzip();

        let results = join_all(handles).await;

        channels
            .into_iter()
            .zip(results)
            .map(|(channel, joined)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(channel = %channel, error = %e, "Channel attempt aborted");
                    ChannelOutcome::failed(channel, format!("channel attempt aborted: {}", e))
                }
            })
            .collect()
    }
}

/// Everything one spawned channel attempt needs, owned.
struct ChannelAttempt {
    adapter: Option<Arc<dyn ChannelAdapter>>,
    deadlines: Arc<dyn DeadlineLookup>,
    device_tokens: Arc<dyn DeviceTokenLookup>,
    timeout: Option<Duration>,
}

impl ChannelAttempt {
    async fn run(self, task: DispatchTask) -> ChannelOutcome {
        let channel = task.channel;
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.attempt(task))
                .await
                .unwrap_or_else(|_| {
                    ChannelOutcome::failed(
                        channel,
                        format!("timed out after {} ms", limit.as_millis()),
                    )
                }),
            None => self.attempt(task).await,
        };

        if !outcome.success {
            tracing::warn!(
                channel = %channel,
                kind = %outcome.kind,
                error = outcome.error.as_deref().unwrap_or(""),
                "Channel delivery failed"
            );
        }
        outcome
    }

    async fn attempt(&self, task: DispatchTask) -> ChannelOutcome {
        let channel = task.channel;
        let mut message = OutboundMessage::new(channel, task.payload);

        match channel {
            ChannelKind::Calendar => {
                let Some(deadline_id) = message.payload.deadline_id else {
                    return ChannelOutcome::failed(channel, "calendar sync needs a deadline_id");
                };
                match self.deadlines.find_deadline(deadline_id).await {
                    Ok(Some(deadline)) => message.deadline = Some(deadline),
                    Ok(None) => {
                        return ChannelOutcome::failed(
                            channel,
                            format!("deadline {} not found", deadline_id),
                        );
                    }
                    Err(e) => {
                        return ChannelOutcome::failed(channel, format!("deadline lookup failed: {}", e));
                    }
                }
            }
            ChannelKind::Push => {
                match self.device_tokens.device_token(&message.payload.recipient).await {
                    Ok(Some(token)) => message.device_token = Some(token),
                    Ok(None) => {
                        return ChannelOutcome::failed(channel, "no registered device token");
                    }
                    Err(e) => {
                        return ChannelOutcome::failed(
                            channel,
                            format!("device token lookup failed: {}", e),
                        );
                    }
                }
            }
            ChannelKind::Email | ChannelKind::Chat => {}
        }

        let Some(adapter) = &self.adapter else {
            return ChannelOutcome::not_implemented(channel, "no adapter configured for channel");
        };

        match adapter.send(&message).await {
            Ok(()) => ChannelOutcome::delivered(channel),
            Err(ChannelError::NotImplemented(detail)) => {
                ChannelOutcome::not_implemented(channel, detail)
            }
            Err(e) => ChannelOutcome::failed(channel, e.to_string()),
        }
    }
}
