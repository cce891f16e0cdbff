//! Token-bucket rate limiter keyed by remote address (spec §4.9 middleware
//! 3): 100 requests/second, capacity 100, buckets unused for 60 s are swept.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

const CAPACITY: f64 = 100.0;
const REFILL_PER_SEC: f64 = 100.0;
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const IDLE_EVICT_AFTER: Duration = Duration::from_secs(60);

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    last_used: Instant,
}

pub struct RateLimiter {
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    /// Spawns the 60 s sweeper alongside the limiter; callers hold on to
    /// the returned `Arc` for the life of the process.
    pub fn spawn() -> Arc<Self> {
        let limiter = Arc::new(RateLimiter {
            buckets: Mutex::new(HashMap::new()),
        });
        let sweeper = limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                sweeper.sweep();
            }
        });
        limiter
    }

    fn sweep(&self) {
        let now = Instant::now();
        lock(&self.buckets).retain(|_, bucket| now.duration_since(bucket.last_used) < IDLE_EVICT_AFTER);
    }

    /// Consumes one token for `addr`, refilling proportionally to elapsed
    /// time since the bucket was last touched. Returns `false` once the
    /// bucket is empty.
    pub fn allow(&self, addr: IpAddr) -> bool {
        let now = Instant::now();
        let mut buckets = lock(&self.buckets);
        let bucket = buckets.entry(addr).or_insert_with(|| Bucket {
            tokens: CAPACITY,
            last_refill: now,
            last_used: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * REFILL_PER_SEC).min(CAPACITY);
        bucket.last_refill = now;
        bucket.last_used = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
#[path = "rate_limit.test.rs"]
mod tests;
