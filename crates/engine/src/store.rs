//! Notification record store.
//!
//! The engine writes a record twice: `create` in `pending`, then a single
//! `update_status` to the terminal state. Updates only apply to pending rows,
//! so a terminal record is never rewritten.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use deadsync_common::types::{ChannelDelivery, DeliveryStatus, NotificationRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("notification {0} already exists")]
    Duplicate(Uuid),

    #[error("notification {0} not found")]
    NotFound(Uuid),

    #[error("notification {id} cannot move to {status}")]
    InvalidTransition { id: Uuid, status: DeliveryStatus },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record. Fails with `Duplicate` if the id exists.
    async fn create(&self, record: &NotificationRecord) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<NotificationRecord>, StoreError>;

    /// Move a pending record to `status`. `sent_at` must be set exactly for `Sent`.
    async fn update_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Persist the per-channel results of a dispatch.
    async fn record_outcomes(
        &self,
        id: Uuid,
        deliveries: &[ChannelDelivery],
    ) -> Result<(), StoreError>;

    async fn outcomes(&self, id: Uuid) -> Result<Vec<ChannelDelivery>, StoreError>;

    /// Records for a user, newest first, optionally narrowed to one deadline.
    async fn list(
        &self,
        user_id: Uuid,
        deadline_id: Option<Uuid>,
    ) -> Result<Vec<NotificationRecord>, StoreError>;
}

fn check_transition(
    id: Uuid,
    status: DeliveryStatus,
    sent_at: Option<DateTime<Utc>>,
) -> Result<(), StoreError> {
    let consistent = sent_at.is_some() == (status == DeliveryStatus::Sent);
    if !status.is_terminal() || !consistent {
        return Err(StoreError::InvalidTransition { id, status });
    }
    Ok(())
}

/// PostgreSQL-backed store over the `notifications` and
/// `notification_deliveries` tables.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications
                (id, user_id, deadline_id, notification_type, channels, status,
                 recipient, subject, body, scheduled_at, sent_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.deadline_id)
        .bind(&record.notification_type)
        .bind(&record.channels)
        .bind(record.status.to_string())
        .bind(&record.recipient)
        .bind(&record.subject)
        .bind(&record.body)
        .bind(record.scheduled_at)
        .bind(record.sent_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate(record.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<NotificationRecord>, StoreError> {
        let record: Option<NotificationRecord> =
            sqlx::query_as("SELECT * FROM notifications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        check_transition(id, status, sent_at)?;

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = $2, sent_at = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get(id).await? {
                Some(_) => Err(StoreError::InvalidTransition { id, status }),
                None => Err(StoreError::NotFound(id)),
            };
        }
        Ok(())
    }

    async fn record_outcomes(
        &self,
        id: Uuid,
        deliveries: &[ChannelDelivery],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for delivery in deliveries {
            sqlx::query(
                r#"
                INSERT INTO notification_deliveries
                    (notification_id, channel, success, kind, error_detail, attempted_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(delivery.channel.to_string())
            .bind(delivery.success)
            .bind(delivery.kind.to_string())
            .bind(&delivery.error_detail)
            .bind(delivery.attempted_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn outcomes(&self, id: Uuid) -> Result<Vec<ChannelDelivery>, StoreError> {
        let mut rows: Vec<ChannelDelivery> = sqlx::query_as(
            r#"
            SELECT notification_id, channel, success, kind, error_detail, attempted_at
            FROM notification_deliveries
            WHERE notification_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        rows.sort_by_key(|d| d.channel);
        Ok(rows)
    }

    async fn list(
        &self,
        user_id: Uuid,
        deadline_id: Option<Uuid>,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        let records: Vec<NotificationRecord> = sqlx::query_as(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR deadline_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(deadline_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

/// Store held in process memory.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<Uuid, NotificationRecord>>,
    deliveries: RwLock<HashMap<Uuid, Vec<ChannelDelivery>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<NotificationRecord>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        check_transition(id, status, sent_at)?;

        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.status.is_terminal() {
            return Err(StoreError::InvalidTransition { id, status });
        }
        record.status = status;
        record.sent_at = sent_at;
        Ok(())
    }

    async fn record_outcomes(
        &self,
        id: Uuid,
        deliveries: &[ChannelDelivery],
    ) -> Result<(), StoreError> {
        if !self.records.read().await.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        self.deliveries
            .write()
            .await
            .entry(id)
            .or_default()
            .extend_from_slice(deliveries);
        Ok(())
    }

    async fn outcomes(&self, id: Uuid) -> Result<Vec<ChannelDelivery>, StoreError> {
        let mut rows = self
            .deliveries
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by_key(|d| d.channel);
        Ok(rows)
    }

    async fn list(
        &self,
        user_id: Uuid,
        deadline_id: Option<Uuid>,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        let mut records: Vec<NotificationRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .filter(|r| deadline_id.is_none() || r.deadline_id == deadline_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
