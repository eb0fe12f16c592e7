use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Pins `START_TIME` to now unless it is already set. Called first thing in
/// `main` so uptime counts from process start.
pub fn record_start_time() -> DateTime<Utc> {
    *Lazy::force(&START_TIME)
}

/// Key prefix for the contact submission rate-limit windows.
pub const CONTACT_RATE_LIMIT_PREFIX: &str = "rl:contact";

pub const HEALTH_CACHE_SECS: i64 = 5;

pub const LIMITER_EVICTION_INTERVAL_SECS: u64 = 60;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_time_is_fixed_once_recorded() {
        let before = Utc::now();
        let first = record_start_time();
        let second = record_start_time();

        assert_eq!(first, second);
        assert_eq!(*START_TIME, first);
        assert!(first >= before - chrono::Duration::seconds(1));
    }
}
