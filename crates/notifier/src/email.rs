//! Email delivery through the Resend HTTP API.

use async_trait::async_trait;
use serde_json::json;

use deadsync_common::types::{ChannelKind, NotificationPayload, OutboundMessage};

use crate::{ChannelAdapter, ChannelError, ensure_success};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

pub struct EmailAdapter {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl EmailAdapter {
    pub fn new(client: reqwest::Client, api_key: String, from: String) -> Self {
        Self {
            client,
            api_key,
            from,
        }
    }

    /// Wrap the plain-text body in the deadline reminder HTML template.
    pub fn render_html(payload: &NotificationPayload) -> String {
        let accent = if payload.is_urgent() {
            "#dc2626 0%, #f97316 100%"
        } else {
            "#ff7f50 0%, #ffb347 100%"
        };

        format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background: linear-gradient(135deg, {accent}); padding: 20px; border-radius: 8px 8px 0 0; color: white;">
    <h1 style="margin: 0; font-size: 24px;">{subject}</h1>
  </div>
  <div style="padding: 20px; background: #f9f9f9; border: 1px solid #ddd;">
    <p style="margin: 0;">{body}</p>
  </div>
  <div style="padding: 15px; background: #fff; text-align: center; border: 1px solid #ddd; border-top: none;">
    <p style="margin: 0; font-size: 12px; color: #999;">DeadlineSync</p>
  </div>
</div>"#,
            accent = accent,
            subject = escape_html(&payload.subject),
            body = escape_html(&payload.body).replace('\n', "<br>"),
        )
    }
}

#[async_trait]
impl ChannelAdapter for EmailAdapter {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let payload = &message.payload;
        let body = json!({
            "from": self.from,
            "to": [payload.recipient],
            "subject": payload.subject,
            "html": Self::render_html(payload),
        });

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;

        tracing::debug!(recipient = %payload.recipient, "Email accepted by Resend");
        Ok(())
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
