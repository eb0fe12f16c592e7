use deadpool_redis::{Config, Pool, Runtime};

/// Builds the Redis pool. Connections are opened lazily, so a bad URL
/// surfaces here but an unreachable server only on first use.
pub fn create_redis_pool(redis_url: &str) -> Option<Pool> {
    Config::from_url(redis_url)
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| tracing::error!("Redis pool creation error: {}", e))
        .ok()
}
