//! Per-client token-bucket rate limiting.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::http::response;
use crate::observability::metrics;

/// Clients tracked before idle buckets are evicted.
const MAX_TRACKED_CLIENTS: usize = 10_000;
/// A bucket untouched for this long is eligible for eviction.
const IDLE_EVICTION: Duration = Duration::from_secs(180);
/// Minimum time between two eviction sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token buckets keyed by client address.
///
/// Once the table is full, idle buckets are swept at most once per
/// [`SWEEP_INTERVAL`]; active clients are never evicted, so the table may
/// grow past the cap between sweeps.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<String, TokenBucket>,
    rps: f64,
    burst: f64,
    max_tracked: usize,
    idle_eviction: Duration,
    sweep_interval: Duration,
    last_sweep: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            rps: config.rps,
            burst: f64::from(config.burst),
            max_tracked: MAX_TRACKED_CLIENTS,
            idle_eviction: IDLE_EVICTION,
            sweep_interval: SWEEP_INTERVAL,
            last_sweep: Mutex::new(None),
        }
    }

    /// Take one token for `client`. False when the client is over its limit.
    pub fn check(&self, client: &str) -> bool {
        if self.buckets.len() >= self.max_tracked {
            self.maybe_sweep();
        }

        let mut bucket = self
            .buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::new(self.burst));
        bucket.try_acquire(self.burst, self.rps)
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Sweep unless another caller is sweeping or one ran within the interval.
    fn maybe_sweep(&self) {
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if last_sweep.is_some_and(|at| at.elapsed() < self.sweep_interval) {
            return;
        }
        *last_sweep = Some(Instant::now());
        drop(last_sweep);

        self.evict_idle(self.idle_eviction);
    }

    fn evict_idle(&self, idle: Duration) {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| bucket.last_update.elapsed() < idle);
        tracing::debug!(evicted = before - self.buckets.len(), "Evicted idle rate limit buckets");
    }
}

/// Reject requests from clients over their limit with `429`.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if limiter.check(&client) {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        metrics::record_rate_limited();
        response::rate_limit_exceeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(rps: f64, burst: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            rps,
            burst,
            enabled: true,
        })
    }

    #[test]
    fn burst_then_reject() {
        let limiter = limiter(1.0, 3);
        assert!(limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));
    }

    #[test]
    fn clients_have_separate_buckets() {
        let limiter = limiter(1.0, 1);
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.2"));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn tokens_refill_over_time() {
        let limiter = limiter(100.0, 1);
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("10.0.0.1"));
    }

    #[test]
    fn full_table_is_swept_at_most_once_per_interval() {
        let mut limiter = limiter(1.0, 1);
        limiter.max_tracked = 2;
        limiter.idle_eviction = Duration::ZERO;
        limiter.sweep_interval = Duration::from_secs(3_600);

        limiter.check("10.0.0.1");
        limiter.check("10.0.0.2");
        // Full: this call sweeps both idle buckets before tracking the new client.
        limiter.check("10.0.0.3");
        assert_eq!(limiter.tracked_clients(), 1);

        for client in ["10.0.0.4", "10.0.0.5", "10.0.0.6"] {
            limiter.check(client);
        }
        // Still full, but the interval has not passed, so nothing is swept.
        assert_eq!(limiter.tracked_clients(), 4);
        assert!(!limiter.check("10.0.0.3"));
    }

    #[test]
    fn idle_buckets_are_evicted() {
        let limiter = limiter(1.0, 1);
        limiter.check("10.0.0.1");
        limiter.check("10.0.0.2");

        limiter.evict_idle(Duration::ZERO);
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
