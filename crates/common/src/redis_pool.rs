use redis::Client;
use redis::aio::ConnectionManager;

/// Connect to the Redis instance holding registered push device tokens.
///
/// Fails at startup if the server does not answer a PING, instead of on the
/// first push delivery.
pub async fn create_redis_manager(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let client = Client::open(redis_url)?;
    let mut manager = ConnectionManager::new(client).await?;

    let pong: String = redis::cmd("PING").query_async(&mut manager).await?;
    tracing::info!(reply = %pong, "Device token registry reachable");
    Ok(manager)
}
