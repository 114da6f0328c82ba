//! Health check endpoint.
//!
//! Reports which delivery channels have an adapter, so a deployment missing
//! provider credentials is visible without sending a notification.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use deadsync_common::types::ChannelKind;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub channels: Vec<ChannelKind>,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "deadsync-api",
        version: env!("CARGO_PKG_VERSION"),
        channels: state.engine.configured_channels(),
    })
}
