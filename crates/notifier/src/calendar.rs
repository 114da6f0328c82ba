//! Calendar sync through the Google Calendar v3 events API.
//!
//! The event spans from the moment of dispatch to the deadline's due date,
//! with a popup reminder shortly before it ends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use deadsync_common::types::{ChannelKind, Deadline, NotificationPayload, OutboundMessage};

use crate::{ChannelAdapter, ChannelError, ensure_success};

const GOOGLE_CALENDAR_BASE: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Minutes before the event a reminder fires.
const REMINDER_MINUTES: u32 = 15;

pub struct GoogleCalendarAdapter {
    client: reqwest::Client,
    access_token: String,
    calendar_id: String,
}

impl GoogleCalendarAdapter {
    pub fn new(client: reqwest::Client, access_token: String, calendar_id: String) -> Self {
        Self {
            client,
            access_token,
            calendar_id,
        }
    }

    /// Events collection URL. The calendar id is a single, encoded path segment.
    pub fn events_url(calendar_id: &str) -> Result<reqwest::Url, ChannelError> {
        let mut url = reqwest::Url::parse(GOOGLE_CALENDAR_BASE)
            .map_err(|e| ChannelError::InvalidEndpoint(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ChannelError::InvalidEndpoint(GOOGLE_CALENDAR_BASE.to_string()))?
            .push(calendar_id)
            .push("events");
        Ok(url)
    }

    /// Build the event resource for `deadline`.
    pub fn build_event(
        deadline: &Deadline,
        payload: &NotificationPayload,
        start: DateTime<Utc>,
    ) -> serde_json::Value {
        let description = deadline
            .description
            .clone()
            .unwrap_or_else(|| payload.body.clone());

        json!({
            "summary": deadline.title,
            "description": description,
            "start": { "dateTime": start.to_rfc3339(), "timeZone": "UTC" },
            "end": { "dateTime": deadline.due_date.to_rfc3339(), "timeZone": "UTC" },
            "reminders": {
                "useDefault": false,
                "overrides": [{ "method": "popup", "minutes": REMINDER_MINUTES }]
            }
        })
    }
}

#[async_trait]
impl ChannelAdapter for GoogleCalendarAdapter {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Calendar
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let deadline = message
            .deadline
            .as_ref()
            .ok_or_else(|| ChannelError::MissingInput("calendar sync needs a deadline".into()))?;

        let event = Self::build_event(deadline, &message.payload, Utc::now());
        let url = Self::events_url(&self.calendar_id)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&event)
            .send()
            .await?;
        ensure_success(response).await?;

        tracing::debug!(deadline_id = %deadline.id, "Deadline synced to Google Calendar");
        Ok(())
    }
}
