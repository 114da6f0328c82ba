use std::time::Duration;

use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string (device token registry)
    pub redis_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// HTTP listen port (default: 3000)
    pub api_port: u16,

    /// Resend API key for email delivery
    pub resend_api_key: Option<String>,

    /// Email sender address
    pub email_from: Option<String>,

    /// Microsoft Teams incoming webhook URL for chat delivery
    pub teams_webhook_url: Option<String>,

    /// Google Calendar OAuth access token
    pub google_calendar_token: Option<String>,

    /// Google Calendar id events are inserted into (default: "primary")
    pub google_calendar_id: String,

    /// Firebase Cloud Messaging server key for push delivery
    pub fcm_server_key: Option<String>,

    /// Upper bound on a single channel attempt, in milliseconds.
    /// Unset means adapters bound their own latency.
    pub dispatch_channel_timeout_ms: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
            resend_api_key: non_empty_var("RESEND_API_KEY"),
            email_from: non_empty_var("EMAIL_FROM"),
            teams_webhook_url: non_empty_var("TEAMS_WEBHOOK_URL"),
            google_calendar_token: non_empty_var("GOOGLE_CALENDAR_TOKEN"),
            google_calendar_id: non_empty_var("GOOGLE_CALENDAR_ID")
                .unwrap_or_else(|| "primary".to_string()),
            fcm_server_key: non_empty_var("FCM_SERVER_KEY"),
            dispatch_channel_timeout_ms: non_empty_var("DISPATCH_CHANNEL_TIMEOUT_MS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("DISPATCH_CHANNEL_TIMEOUT_MS must be a valid u64"))?,
        })
    }

    /// Per-channel timeout, if one is configured.
    pub fn channel_timeout(&self) -> Option<Duration> {
        self.dispatch_channel_timeout_ms.map(Duration::from_millis)
    }
}

/// Read an optional variable, treating an empty value as unset.
fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
