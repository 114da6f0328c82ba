//! HTTP surface for notification dispatch.
//!
//! Endpoints:
//! - GET  /health
//! - POST /api/notifications — Dispatch a notification across its channels
//! - GET  /api/notifications?user_id=&deadline_id= — List a user's notifications
//! - GET  /api/notifications/:id — One notification with its per-channel results

pub mod routes;
pub mod state;
