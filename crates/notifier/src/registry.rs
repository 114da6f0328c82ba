//! Set of channel adapters available to the dispatch engine.

use std::collections::HashMap;
use std::sync::Arc;

use deadsync_common::config::AppConfig;
use deadsync_common::types::ChannelKind;

use crate::ChannelAdapter;
use crate::calendar::GoogleCalendarAdapter;
use crate::chat::TeamsAdapter;
use crate::email::EmailAdapter;
use crate::push::FcmPushAdapter;

/// Adapters keyed by the channel they deliver on. At most one per channel.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    adapters: HashMap<ChannelKind, Arc<dyn ChannelAdapter>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter`, replacing any adapter already bound to its channel.
    pub fn register(&mut self, adapter: Arc<dyn ChannelAdapter>) {
        let channel = adapter.channel();
        if self.adapters.insert(channel, adapter).is_some() {
            tracing::warn!(channel = %channel, "Replaced existing channel adapter");
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ChannelAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, channel: ChannelKind) -> Option<Arc<dyn ChannelAdapter>> {
        self.adapters.get(&channel).cloned()
    }

    /// Channels that have an adapter, in priority order.
    pub fn configured(&self) -> Vec<ChannelKind> {
        ChannelKind::ALL
            .into_iter()
            .filter(|c| self.adapters.contains_key(c))
            .collect()
    }

    /// Build the adapters whose credentials are present in `config`.
    ///
    /// Channels without credentials are left out; dispatching to them yields a
    /// `not_implemented` outcome rather than a silent success.
    pub fn from_config(config: &AppConfig, client: reqwest::Client) -> Self {
        let mut registry = Self::new();

        match (&config.resend_api_key, &config.email_from) {
            (Some(key), Some(from)) => registry.register(Arc::new(EmailAdapter::new(
                client.clone(),
                key.clone(),
                from.clone(),
            ))),
            (Some(_), None) | (None, Some(_)) => tracing::warn!(
                "Email channel disabled: RESEND_API_KEY and EMAIL_FROM must both be set"
            ),
            (None, None) => {}
        }

        if let Some(url) = &config.teams_webhook_url {
            registry.register(Arc::new(TeamsAdapter::new(client.clone(), url.clone())));
        }

        if let Some(token) = &config.google_calendar_token {
            registry.register(Arc::new(GoogleCalendarAdapter::new(
                client.clone(),
                token.clone(),
                config.google_calendar_id.clone(),
            )));
        }

        if let Some(key) = &config.fcm_server_key {
            registry.register(Arc::new(FcmPushAdapter::new(client, key.clone())));
        }

        let enabled: Vec<String> = registry
            .configured()
            .iter()
            .map(ToString::to_string)
            .collect();
        tracing::info!(channels = %enabled.join(","), "Channel adapters configured");

        registry
    }
}
