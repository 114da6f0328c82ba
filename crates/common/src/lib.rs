//! Shared types, configuration and infrastructure helpers for DeadlineSync.

pub mod config;
pub mod db;
pub mod error;
pub mod redis_pool;
pub mod types;
