//! Rate limiter implementation
//!
//! Provides per-key token buckets that refill completely once per period.
//! A bucket never trickles tokens back: it is either exhausted until the
//! next period boundary or refilled to full capacity at that boundary.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Bucket capacity and refill period applied to every key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Tokens available per period
    pub capacity: u32,
    /// Time between full refills
    pub refill_period: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            refill_period: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(capacity: u32, refill_period: Duration) -> Self {
        Self {
            capacity,
            refill_period,
        }
    }
}

/// Time source for bucket refills
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Monotonic system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Token bucket state for a single key
#[derive(Debug)]
struct TokenBucket {
    capacity: u32,
    refill_period: Duration,
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(config: RateLimitConfig, now: Instant) -> Self {
        Self {
            capacity: config.capacity,
            refill_period: config.refill_period,
            tokens: config.capacity,
            last_refill: now,
        }
    }

    fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens == 0 {
            return false;
        }

        self.tokens -= 1;
        true
    }

    /// Refill to capacity if at least one period boundary has passed.
    /// Boundaries stay aligned to the bucket's creation time.
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);

        if self.refill_period.is_zero() {
            self.tokens = self.capacity;
            self.last_refill = now;
            return;
        }

        if elapsed < self.refill_period {
            return;
        }

        let period_nanos = self.refill_period.as_nanos();
        let whole_periods = elapsed.as_nanos() / period_nanos;
        let advance = whole_periods.saturating_mul(period_nanos);

        self.last_refill += Duration::from_nanos(u64::try_from(advance).unwrap_or(u64::MAX));
        self.tokens = self.capacity;
    }
}

/// Rate limiter for API keys
///
/// Buckets are created lazily on the first request for a key and are kept
/// until [`RateLimiter::clear_all`]. Each bucket has its own lock, so callers
/// using different keys never wait on each other.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: RwLock<HashMap<String, Arc<Mutex<TokenBucket>>>>,
    config: RwLock<RateLimitConfig>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create with a custom time source
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            config: RwLock::new(config),
            clock,
        }
    }

    /// Try to consume one token for `key`
    pub async fn try_admit(&self, key: &str) -> bool {
        let bucket = self.bucket_for(key).await;
        let admitted = bucket.lock().await.try_consume(self.clock.now());

        if !admitted {
            debug!(key_prefix = %key.chars().take(8).collect::<String>(), "Rate limit exhausted");
            counter!("rate_limiter_rejections_total").increment(1);
        }

        admitted
    }

    /// Drop every bucket; the next request for any key starts full
    pub async fn clear_all(&self) {
        let mut buckets = self.buckets.write().await;
        let cleared = buckets.len();
        buckets.clear();

        debug!(cleared, "Cleared all rate limit buckets");
    }

    /// Replace capacity and period, then clear all buckets
    pub async fn reconfigure(&self, config: RateLimitConfig) {
        let mut buckets = self.buckets.write().await;
        *self.config.write().await = config;
        let cleared = buckets.len();
        buckets.clear();

        debug!(cleared, capacity = config.capacity, "Reconfigured rate limiter");
    }

    /// Current configuration
    pub async fn config(&self) -> RateLimitConfig {
        *self.config.read().await
    }

    /// Number of keys with live bucket state
    pub async fn tracked_keys(&self) -> usize {
        self.buckets.read().await.len()
    }

    async fn bucket_for(&self, key: &str) -> Arc<Mutex<TokenBucket>> {
        if let Some(bucket) = self.buckets.read().await.get(key) {
            return Arc::clone(bucket);
        }

        let mut buckets = self.buckets.write().await;
        // Config is read under the map lock; reconfigure swaps it under the same lock.
        let config = self.config().await;
        let now = self.clock.now();

        // Another request may have created the bucket while we waited for the write lock.
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TokenBucket::full(config, now))));

        Arc::clone(bucket)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
