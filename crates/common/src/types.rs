use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification delivery channel.
///
/// Variant order is the dispatch priority: email, chat, calendar, push.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Chat,
    Calendar,
    Push,
}

impl ChannelKind {
    /// Every channel, in dispatch priority order.
    pub const ALL: [ChannelKind; 4] = [
        ChannelKind::Email,
        ChannelKind::Chat,
        ChannelKind::Calendar,
        ChannelKind::Push,
    ];

    /// Parse a client-supplied channel identifier.
    ///
    /// Matching is case-insensitive; `teams` is accepted for the chat channel.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "email" => Some(ChannelKind::Email),
            "chat" | "teams" => Some(ChannelKind::Chat),
            "calendar" => Some(ChannelKind::Calendar),
            "push" => Some(ChannelKind::Push),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Chat => "chat",
            ChannelKind::Calendar => "calendar",
            ChannelKind::Push => "push",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate delivery status of a notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    /// `sent` and `failed` are final; a record never leaves them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// How a single channel attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum OutcomeKind {
    Delivered,
    Failed,
    /// No adapter is wired up for the channel. Never counts as a success.
    NotImplemented,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Delivered => write!(f, "delivered"),
            OutcomeKind::Failed => write!(f, "failed"),
            OutcomeKind::NotImplemented => write!(f, "not_implemented"),
        }
    }
}

/// Result of attempting one channel during one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub channel: ChannelKind,
    pub success: bool,
    pub kind: OutcomeKind,
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn delivered(channel: ChannelKind) -> Self {
        Self {
            channel,
            success: true,
            kind: OutcomeKind::Delivered,
            error: None,
        }
    }

    pub fn failed(channel: ChannelKind, detail: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            kind: OutcomeKind::Failed,
            error: Some(detail.into()),
        }
    }

    pub fn not_implemented(channel: ChannelKind, detail: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            kind: OutcomeKind::NotImplemented,
            error: Some(detail.into()),
        }
    }
}

fn default_channels() -> Vec<String> {
    vec![ChannelKind::Email.to_string()]
}

/// Inbound request to notify a user about a deadline.
///
/// Required fields are optional here so that missing values surface as
/// validation errors from the plan builder rather than body rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub deadline_id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub notification_type: Option<String>,
    /// Raw channel identifiers; omitted means email only.
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Durable record of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub deadline_id: Option<Uuid>,
    pub notification_type: String,
    /// Comma-joined channel identifiers in priority order.
    pub channels: String,
    pub status: DeliveryStatus,
    pub recipient: String,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Build a fresh `pending` record with a newly generated id.
    pub fn pending(
        request: &NotificationRequest,
        user_id: Uuid,
        notification_type: &str,
        recipient: &str,
        channels: &[ChannelKind],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            deadline_id: request.deadline_id,
            notification_type: notification_type.to_string(),
            channels: channels
                .iter()
                .map(ChannelKind::as_str)
                .collect::<Vec<_>>()
                .join(","),
            status: DeliveryStatus::Pending,
            recipient: recipient.to_string(),
            subject: request.subject.clone(),
            body: request.body.clone(),
            scheduled_at: request.scheduled_at.unwrap_or(now),
            sent_at: None,
            created_at: now,
        }
    }

    /// Stored channel set, parsed back into channel kinds.
    pub fn channel_list(&self) -> Vec<ChannelKind> {
        self.channels
            .split(',')
            .filter_map(ChannelKind::parse)
            .collect()
    }
}

/// Stored per-channel result of a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChannelDelivery {
    pub notification_id: Uuid,
    pub channel: ChannelKind,
    pub success: bool,
    pub kind: OutcomeKind,
    pub error_detail: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl ChannelDelivery {
    pub fn from_outcome(
        notification_id: Uuid,
        outcome: &ChannelOutcome,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            notification_id,
            channel: outcome.channel,
            success: outcome.success,
            kind: outcome.kind,
            error_detail: outcome.error.clone(),
            attempted_at,
        }
    }
}

/// A user's deadline, read by the calendar channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Deadline {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
}

/// Rendered notification content shared by every channel of a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Free-form tag such as "reminder" or "urgent"
    pub notification_type: String,
    pub deadline_id: Option<Uuid>,
}

impl NotificationPayload {
    pub fn is_urgent(&self) -> bool {
        self.notification_type.eq_ignore_ascii_case("urgent")
    }
}

/// Message handed to a channel adapter, with channel preconditions resolved.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub channel: ChannelKind,
    pub payload: NotificationPayload,
    /// Present for calendar deliveries
    pub deadline: Option<Deadline>,
    /// Present for push deliveries
    pub device_token: Option<String>,
}

impl OutboundMessage {
    pub fn new(channel: ChannelKind, payload: NotificationPayload) -> Self {
        Self {
            channel,
            payload,
            deadline: None,
            device_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse_aliases_and_case() {
        assert_eq!(ChannelKind::parse("EMAIL"), Some(ChannelKind::Email));
        assert_eq!(ChannelKind::parse(" teams "), Some(ChannelKind::Chat));
        assert_eq!(ChannelKind::parse("chat"), Some(ChannelKind::Chat));
        assert_eq!(ChannelKind::parse("sms"), None);
    }

    #[test]
    fn test_channel_priority_order() {
        let mut channels = vec![ChannelKind::Push, ChannelKind::Email, ChannelKind::Calendar];
        channels.sort();
        assert_eq!(
            channels,
            vec![ChannelKind::Email, ChannelKind::Calendar, ChannelKind::Push]
        );
    }

    #[test]
    fn test_request_defaults_to_email() {
        let req: NotificationRequest = serde_json::from_value(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "type": "reminder",
            "recipient": "a@x.com"
        }))
        .unwrap();
        assert_eq!(req.channels, vec!["email".to_string()]);
        assert!(req.user_id.is_some());
        assert_eq!(req.notification_type.as_deref(), Some("reminder"));
    }

    #[test]
    fn test_pending_record_joins_channels() {
        let req: NotificationRequest = serde_json::from_value(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "type": "reminder",
            "recipient": "a@x.com",
            "channels": ["push", "email"]
        }))
        .unwrap();
        let now = Utc::now();
        let record = NotificationRecord::pending(
            &req,
            Uuid::new_v4(),
            "reminder",
            "a@x.com",
            &[ChannelKind::Email, ChannelKind::Push],
            now,
        );
        assert_eq!(record.channels, "email,push");
        assert_eq!(record.status, DeliveryStatus::Pending);
        assert_eq!(record.sent_at, None);
        assert_eq!(record.scheduled_at, now);
        assert_eq!(
            record.channel_list(),
            vec![ChannelKind::Email, ChannelKind::Push]
        );
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(ChannelOutcome::delivered(ChannelKind::Email).success);
        let nope = ChannelOutcome::not_implemented(ChannelKind::Push, "no adapter");
        assert!(!nope.success);
        assert_eq!(nope.kind, OutcomeKind::NotImplemented);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!DeliveryStatus::Pending.is_terminal());
        assert!(DeliveryStatus::Sent.is_terminal());
        assert!(DeliveryStatus::Failed.is_terminal());
    }
}
