//! Dispatch plan builder.
//!
//! Validates a `NotificationRequest` and renders one `DispatchTask` per
//! requested channel, ordered email, chat, calendar, push.

use std::collections::BTreeSet;

use deadsync_common::types::{ChannelKind, NotificationPayload, NotificationRequest};
use uuid::Uuid;

use crate::error::DispatchError;

/// Body used when the request does not carry one.
pub const DEFAULT_BODY: &str = "You have a new deadline notification";

/// One channel's share of a dispatch. Consumed exactly once by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTask {
    pub channel: ChannelKind,
    pub payload: NotificationPayload,
}

/// Validated request, ready for record creation and fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPlan {
    pub user_id: Uuid,
    pub notification_type: String,
    pub recipient: String,
    /// Deduplicated channels in priority order.
    pub channels: Vec<ChannelKind>,
    pub tasks: Vec<DispatchTask>,
}

pub struct PlanBuilder;

impl PlanBuilder {
    /// Build the dispatch plan for `request`.
    ///
    /// Unknown channel identifiers are dropped with a warning. The request is
    /// rejected if user, recipient or type is missing, or no known channel remains.
    pub fn build(request: &NotificationRequest) -> Result<DispatchPlan, DispatchError> {
        let user_id = request
            .user_id
            .ok_or_else(|| DispatchError::Validation("user_id is required".to_string()))?;
        let recipient = required(request.recipient.as_deref(), "recipient")?;
        let notification_type = required(request.notification_type.as_deref(), "type")?;

        let mut channels = BTreeSet::new();
        for raw in &request.channels {
            match ChannelKind::parse(raw) {
                Some(channel) => {
                    channels.insert(channel);
                }
                None => tracing::warn!(
                    user_id = %user_id,
                    channel = %raw,
                    "Dropping unknown notification channel"
                ),
            }
        }

        if channels.is_empty() {
            return Err(DispatchError::Validation(format!(
                "at least one valid channel is required (known: {})",
                ChannelKind::ALL.map(|c| c.as_str()).join(", ")
            )));
        }

        let payload = NotificationPayload {
            recipient: recipient.to_string(),
            subject: non_blank(request.subject.as_deref())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Deadline Notification: {}", notification_type)),
            body: non_blank(request.body.as_deref())
                .unwrap_or(DEFAULT_BODY)
                .to_string(),
            notification_type: notification_type.to_string(),
            deadline_id: request.deadline_id,
        };

        let channels: Vec<ChannelKind> = channels.into_iter().collect();
        let tasks = channels
            .iter()
            .map(|&channel| DispatchTask {
                channel,
                payload: payload.clone(),
            })
            .collect();

        Ok(DispatchPlan {
            user_id,
            notification_type: notification_type.to_string(),
            recipient: recipient.to_string(),
            channels,
            tasks,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, DispatchError> {
    non_blank(value).ok_or_else(|| DispatchError::Validation(format!("{} is required", field)))
}
