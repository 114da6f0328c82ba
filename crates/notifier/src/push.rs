//! Mobile push through Firebase Cloud Messaging (legacy HTTP API).

use async_trait::async_trait;
use serde_json::json;

use deadsync_common::types::{ChannelKind, NotificationPayload, OutboundMessage};

use crate::{ChannelAdapter, ChannelError, ensure_success};

const FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

pub struct FcmPushAdapter {
    client: reqwest::Client,
    server_key: String,
}

impl FcmPushAdapter {
    pub fn new(client: reqwest::Client, server_key: String) -> Self {
        Self { client, server_key }
    }

    pub fn build_message(device_token: &str, payload: &NotificationPayload) -> serde_json::Value {
        let tag = format!("deadline-{}", payload.notification_type.to_ascii_lowercase());
        json!({
            "to": device_token,
            "notification": {
                "title": payload.subject,
                "body": payload.body,
                "icon": "/icon.svg",
                "tag": tag,
            },
            "data": {
                "type": payload.notification_type,
                "deadline_id": payload.deadline_id,
            }
        })
    }
}

#[async_trait]
impl ChannelAdapter for FcmPushAdapter {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Push
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let token = message
            .device_token
            .as_deref()
            .ok_or_else(|| ChannelError::MissingInput("no registered device token".into()))?;

        let response = self
            .client
            .post(FCM_ENDPOINT)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&Self::build_message(token, &message.payload))
            .send()
            .await?;
        ensure_success(response).await
    }
}
