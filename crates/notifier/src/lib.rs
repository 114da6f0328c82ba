//! Channel adapters for notification delivery.
//!
//! Each adapter turns an `OutboundMessage` into one provider call:
//! - Email (Resend HTTP API)
//! - Chat (Microsoft Teams incoming webhook)
//! - Calendar (Google Calendar events)
//! - Push (Firebase Cloud Messaging)
//!
//! Adapters are built once at startup from `AppConfig` and handed to the
//! dispatch engine through a `ChannelRegistry`.

pub mod calendar;
pub mod chat;
pub mod email;
pub mod push;
pub mod registry;

use async_trait::async_trait;
use thiserror::Error;

use deadsync_common::types::{ChannelKind, OutboundMessage};

pub use registry::ChannelRegistry;

/// Ordinary delivery failures. Adapters return these instead of panicking.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider rejected delivery ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Invalid provider endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Missing delivery input: {0}")]
    MissingInput(String),

    #[error("Channel not implemented: {0}")]
    NotImplemented(String),
}

/// A single delivery mechanism.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// The channel this adapter delivers on.
    fn channel(&self) -> ChannelKind;

    /// Attempt delivery once.
    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError>;
}

/// Map a non-2xx provider response to `ChannelError::Rejected`.
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<(), ChannelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let detail = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
    Err(ChannelError::Rejected {
        status: status.as_u16(),
        detail: truncate(&detail, 512),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
