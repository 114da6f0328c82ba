//! Notification dispatch and query routes.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use deadsync_common::error::AppError;
use deadsync_common::types::{
    ChannelDelivery, ChannelKind, ChannelOutcome, DeliveryStatus, NotificationRecord,
    NotificationRequest,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", post(dispatch_notification))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/{id}", get(get_notification))
}

/// Response for a completed dispatch.
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub notification_id: Uuid,
    pub status: DeliveryStatus,
    pub sent_at: Option<DateTime<Utc>>,
    /// False when the stored record could not be finalized
    pub persisted: bool,
    pub channels: BTreeMap<ChannelKind, bool>,
    pub outcomes: Vec<ChannelOutcome>,
}

/// Query parameters for listing notifications.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub user_id: Uuid,
    pub deadline_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub notifications: Vec<NotificationRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct NotificationDetail {
    #[serde(flatten)]
    pub record: NotificationRecord,
    pub deliveries: Vec<ChannelDelivery>,
}

/// POST /api/notifications — Dispatch across every requested channel.
///
/// Responds once all channels have resolved. Individual channel failures are
/// reported in the body, not as an error status. Unreadable bodies are 400.
async fn dispatch_notification(
    State(state): State<AppState>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DispatchResponse>), AppError> {
    let Json(request) = payload?;
    let report = state.engine.dispatch(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(DispatchResponse {
            notification_id: report.notification_id,
            status: report.status,
            sent_at: report.sent_at,
            persisted: report.persisted,
            channels: report.channel_results(),
            outcomes: report.outcomes,
        }),
    ))
}

/// GET /api/notifications — List a user's notifications, newest first.
async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, AppError> {
    let notifications = state.store.list(params.user_id, params.deadline_id).await?;
    Ok(Json(ListResponse {
        count: notifications.len(),
        notifications,
    }))
}

/// GET /api/notifications/:id — One notification with its stored channel results.
async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationDetail>, AppError> {
    let record = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;
    let deliveries = state.store.outcomes(id).await?;

    Ok(Json(NotificationDetail { record, deliveries }))
}
