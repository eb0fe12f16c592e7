use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use dashmap::DashMap;
use deadpool_redis::Pool as RedisPool;
use derive_more::Display;
use parking_lot::Mutex;
use redis::AsyncCommands;

/// Verdict for one hit against a key's window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Seconds until the current window resets
    pub reset_after: u64,
}

impl RateLimitDecision {
    fn from_count(count: u64, limit: u64, reset_after: Duration) -> Self {
        RateLimitDecision {
            allowed: count <= limit,
            limit,
            remaining: limit.saturating_sub(count),
            reset_after: ceil_secs(reset_after).max(1),
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 { secs + 1 } else { secs }
}

#[derive(Debug, Display)]
pub enum RateLimitError {
    #[display("Redis pool error: {_0}")]
    Pool(String),

    #[display("Redis operation failed: {_0}")]
    Redis(String),
}

/// Fixed window
#[derive(Debug)]
struct FixedWindow {
    started: Instant,
    count: u64,
}

impl FixedWindow {
    fn new(now: Instant) -> Self {
        Self { started: now, count: 0 }
    }

    /// Counts a hit, rolling the window over when it has expired.
    /// Returns (count, time until reset).
    fn hit(&mut self, now: Instant, window: Duration) -> (u64, Duration) {
        if now.duration_since(self.started) >= window {
            self.started = now;
            self.count = 0;
        }
        self.count = self.count.saturating_add(1);
        let reset_after = window.saturating_sub(now.duration_since(self.started));
        (self.count, reset_after)
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.started) >= window
    }
}

type Key = String;

/// --- In-memory store ---
#[derive(Clone)]
pub struct MemoryRateLimitStore {
    map: Arc<DashMap<Key, Arc<Mutex<FixedWindow>>>>,
    limit: u64,
    window: Duration,
}

impl MemoryRateLimitStore {
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            limit,
            window,
        }
    }

    fn get_window(&self, key: &str, now: Instant) -> Arc<Mutex<FixedWindow>> {
        if let Some(existing) = self.map.get(key) {
            existing.clone()
        } else {
            self.map
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(FixedWindow::new(now))))
                .clone()
        }
    }

    pub fn hit(&self, key: &str) -> RateLimitDecision {
        self.hit_at(key, Instant::now())
    }

    pub fn hit_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let window = self.get_window(key, now);
        let (count, reset_after) = window.lock().hit(now, self.window);
        RateLimitDecision::from_count(count, self.limit, reset_after)
    }

    /// Drops windows that have run out. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    pub fn evict_expired_at(&self, now: Instant) -> usize {
        let before = self.map.len();
        let window = self.window;
        self.map.retain(|_, w| !w.lock().is_expired(now, window));
        before.saturating_sub(self.map.len())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// --- Redis store (shared across instances) ---
#[derive(Clone)]
pub struct RedisRateLimitStore {
    pool: RedisPool,
    limit: u64,
    window: Duration,
}

impl RedisRateLimitStore {
    pub fn new(pool: RedisPool, limit: u64, window: Duration) -> Self {
        Self { pool, limit, window }
    }

    pub async fn hit(&self, key: &str) -> Result<RateLimitDecision, RateLimitError> {
        let mut conn = self.pool
            .get()
            .await
            .map_err(|e| RateLimitError::Pool(e.to_string()))?;

        let count: u64 = conn
            .incr(key, 1)
            .await
            .map_err(|e| RateLimitError::Redis(e.to_string()))?;

        if count == 1 {
            let _: () = conn
                .expire(key, self.window.as_secs() as i64)
                .await
                .map_err(|e| RateLimitError::Redis(e.to_string()))?;
        }

        let ttl: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| RateLimitError::Redis(e.to_string()))?;

        // -1 means the expiry was lost (e.g. crash between INCR and EXPIRE)
        let reset_after = if ttl > 0 {
            Duration::from_secs(ttl as u64)
        } else {
            let _: () = conn
                .expire(key, self.window.as_secs() as i64)
                .await
                .map_err(|e| RateLimitError::Redis(e.to_string()))?;
            self.window
        };

        Ok(RateLimitDecision::from_count(count, self.limit, reset_after))
    }
}

/// Per-client fixed-window limiter. Redis is used when configured, with the
/// in-memory store as fallback when Redis is unreachable.
#[derive(Clone)]
pub struct RateLimiter {
    prefix: String,
    memory: MemoryRateLimitStore,
    redis: Option<RedisRateLimitStore>,
}

impl RateLimiter {
    pub fn new(prefix: impl Into<String>, limit: u64, window: Duration, redis_pool: Option<RedisPool>) -> Self {
        Self {
            prefix: prefix.into(),
            memory: MemoryRateLimitStore::new(limit, window),
            redis: redis_pool.map(|pool| RedisRateLimitStore::new(pool, limit, window)),
        }
    }

    pub fn limit(&self) -> u64 {
        self.memory.limit
    }

    pub fn window(&self) -> Duration {
        self.memory.window
    }

    pub fn memory_store(&self) -> &MemoryRateLimitStore {
        &self.memory
    }

    pub async fn check(&self, client: &str) -> RateLimitDecision {
        let key = format!("{}:{}", self.prefix, urlencoding::encode(client));

        if let Some(redis) = &self.redis {
            match redis.hit(&key).await {
                Ok(decision) => return decision,
                Err(e) => tracing::warn!("Rate limit store unavailable, using in-memory fallback: {}", e),
            }
        }

        self.memory.hit(&key)
    }
}
