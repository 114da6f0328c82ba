//! Read-only lookups consumed by channel preconditions.
//!
//! - Calendar needs the related deadline (PostgreSQL `deadlines` table).
//! - Push needs a registered device token (Redis hash keyed by recipient).

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use uuid::Uuid;

use deadsync_common::types::Deadline;

/// Redis hash mapping recipient → push device token.
pub const DEVICE_TOKEN_KEY: &str = "push:device_tokens";

#[async_trait]
pub trait DeadlineLookup: Send + Sync {
    async fn find_deadline(&self, id: Uuid) -> anyhow::Result<Option<Deadline>>;
}

#[async_trait]
pub trait DeviceTokenLookup: Send + Sync {
    async fn device_token(&self, recipient: &str) -> anyhow::Result<Option<String>>;
}

pub struct PgDeadlineLookup {
    pool: PgPool,
}

impl PgDeadlineLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeadlineLookup for PgDeadlineLookup {
    async fn find_deadline(&self, id: Uuid) -> anyhow::Result<Option<Deadline>> {
        let deadline: Option<Deadline> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, description, due_date
            FROM deadlines
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deadline)
    }
}

pub struct RedisDeviceTokenLookup {
    redis: ConnectionManager,
}

impl RedisDeviceTokenLookup {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl DeviceTokenLookup for RedisDeviceTokenLookup {
    async fn device_token(&self, recipient: &str) -> anyhow::Result<Option<String>> {
        // ConnectionManager is a cheap handle; clone to get a mutable one
        let mut redis = self.redis.clone();
        let token: Option<String> = redis.hget(DEVICE_TOKEN_KEY, recipient).await?;
        Ok(token.filter(|t| !t.is_empty()))
    }
}

/// Deadlines held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDeadlines {
    deadlines: HashMap<Uuid, Deadline>,
}

impl InMemoryDeadlines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadlines.insert(deadline.id, deadline);
        self
    }
}

#[async_trait]
impl DeadlineLookup for InMemoryDeadlines {
    async fn find_deadline(&self, id: Uuid) -> anyhow::Result<Option<Deadline>> {
        Ok(self.deadlines.get(&id).cloned())
    }
}

/// Device tokens held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDeviceTokens {
    tokens: HashMap<String, String>,
}

impl InMemoryDeviceTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, recipient: &str, token: &str) -> Self {
        self.tokens.insert(recipient.to_string(), token.to_string());
        self
    }
}

#[async_trait]
impl DeviceTokenLookup for InMemoryDeviceTokens {
    async fn device_token(&self, recipient: &str) -> anyhow::Result<Option<String>> {
        Ok(self.tokens.get(recipient).cloned())
    }
}
