use tokio::time::{interval, Duration};

use crate::{constants::LIMITER_EVICTION_INTERVAL_SECS, limiter::rate_limiter::MemoryRateLimitStore};

pub async fn start_limiter_eviction_task(store: MemoryRateLimitStore) {
    let mut interval = interval(Duration::from_secs(LIMITER_EVICTION_INTERVAL_SECS));

    loop {
        interval.tick().await;

        let removed = store.evict_expired();
        if removed > 0 {
            tracing::debug!("Evicted {} expired rate limit windows", removed);
        }
    }
}
