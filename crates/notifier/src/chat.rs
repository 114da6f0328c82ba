//! Chat delivery through a Microsoft Teams incoming webhook.

use async_trait::async_trait;
use serde_json::json;

use deadsync_common::types::{ChannelKind, NotificationPayload, OutboundMessage};

use crate::{ChannelAdapter, ChannelError, ensure_success};

pub struct TeamsAdapter {
    client: reqwest::Client,
    webhook_url: String,
}

impl TeamsAdapter {
    pub fn new(client: reqwest::Client, webhook_url: String) -> Self {
        Self {
            client,
            webhook_url,
        }
    }

    /// Build a legacy MessageCard. Urgent notifications get high priority.
    pub fn build_card(payload: &NotificationPayload) -> serde_json::Value {
        let (priority, color) = if payload.is_urgent() {
            ("high", "D9534F")
        } else {
            ("medium", "FF7F50")
        };

        json!({
            "@type": "MessageCard",
            "@context": "https://schema.org/extensions",
            "summary": payload.subject,
            "themeColor": color,
            "title": payload.subject,
            "text": payload.body,
            "sections": [{
                "facts": [
                    { "name": "Type", "value": payload.notification_type },
                    { "name": "Priority", "value": priority },
                ]
            }]
        })
    }
}

#[async_trait]
impl ChannelAdapter for TeamsAdapter {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Chat
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let card = Self::build_card(&message.payload);
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&card)
            .send()
            .await?;
        ensure_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(notification_type: &str) -> NotificationPayload {
        NotificationPayload {
            recipient: "team".to_string(),
            subject: "Deadline: report".to_string(),
            body: "Due tomorrow".to_string(),
            notification_type: notification_type.to_string(),
            deadline_id: None,
        }
    }

    #[test]
    fn test_card_urgent_is_high_priority() {
        let card = TeamsAdapter::build_card(&payload("urgent"));
        assert_eq!(card["themeColor"], "D9534F");
        assert_eq!(card["sections"][0]["facts"][1]["value"], "high");
    }

    #[test]
    fn test_card_reminder_is_medium_priority() {
        let card = TeamsAdapter::build_card(&payload("reminder"));
        assert_eq!(card["title"], "Deadline: report");
        assert_eq!(card["text"], "Due tomorrow");
        assert_eq!(card["sections"][0]["facts"][1]["value"], "medium");
    }
}
