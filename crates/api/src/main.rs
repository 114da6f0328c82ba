//! DeadlineSync API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use deadsync_common::config::AppConfig;
use deadsync_common::db::{create_pool, run_migrations};
use deadsync_common::redis_pool::create_redis_manager;
use deadsync_engine::DispatchEngine;
use deadsync_engine::executor::FanOutExecutor;
use deadsync_engine::lookup::{PgDeadlineLookup, RedisDeviceTokenLookup};
use deadsync_engine::store::PgRecordStore;
use deadsync_notifier::ChannelRegistry;

use deadsync_api::routes::create_router;
use deadsync_api::state::AppState;

/// Request timeout for provider HTTP calls made by channel adapters.
const PROVIDER_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "deadsync_api=debug,deadsync_engine=debug,deadsync_notifier=info,tower_http=debug",
            )
        }))
        .init();

    tracing::info!("Starting DeadlineSync API server...");

    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    let redis = create_redis_manager(&config.redis_url).await?;

    // Adapters are built once here and injected into the engine
    let http = reqwest::Client::builder()
        .timeout(PROVIDER_HTTP_TIMEOUT)
        .build()?;
    let adapters = ChannelRegistry::from_config(&config, http);

    let executor = FanOutExecutor::new(
        adapters,
        Arc::new(PgDeadlineLookup::new(pool.clone())),
        Arc::new(RedisDeviceTokenLookup::new(redis)),
    )
    .with_channel_timeout(config.channel_timeout());
    let engine = DispatchEngine::new(executor, Arc::new(PgRecordStore::new(pool)));

    let state = AppState::new(engine);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    Ok(())
}
