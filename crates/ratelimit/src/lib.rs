use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// How long a bucket may sit untouched before a sweep reclaims it.
const DEFAULT_IDLE_AFTER: Duration = Duration::from_secs(600);

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    capacity: f64,
    refill_per_sec: f64,
}

impl TokenBucket {
    fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
            capacity,
            refill_per_sec,
        }
    }

    fn refill(&mut self) {
        let elapsed = self.last_refill.elapsed().as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = Instant::now();
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn idle_since(&self) -> Duration {
        self.last_refill.elapsed()
    }
}

/// Per-client-IP token bucket limiter. Unlike a fetch-side limiter that
/// waits for a slot to open up, a request-path limiter must answer
/// immediately: no tokens available means deny now, never sleep-and-retry.
pub struct IpRateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    capacity: f64,
    refill_per_sec: f64,
    idle_after: Duration,
}

impl IpRateLimiter {
    pub fn new(requests_per_min: u32, burst_limit: u32) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity: burst_limit.max(1) as f64,
            refill_per_sec: requests_per_min as f64 / 60.0,
            idle_after: DEFAULT_IDLE_AFTER,
        }
    }

    /// Attempt to consume one token for `client_ip`. Never blocks.
    pub fn try_acquire(&self, client_ip: &str) -> bool {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets
            .entry(client_ip.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity, self.refill_per_sec));
        bucket.try_acquire()
    }

    /// Drop buckets that haven't been touched in `idle_after`. Keeps
    /// per-IP memory bounded under churn from rotating or one-shot
    /// clients.
    pub fn sweep_idle(&self) -> usize {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.idle_since() < self.idle_after);
        before - buckets.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().expect("rate limiter mutex poisoned").len()
    }

    /// Spawn a background sweep loop. Intended to be handed to
    /// `tokio::spawn` once at startup alongside the server task.
    pub async fn run_idle_sweeper(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let reclaimed = self.sweep_idle();
            if reclaimed > 0 {
                tracing::debug!(reclaimed, "rate limiter reclaimed idle buckets");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn allows_burst_then_denies() {
        let limiter = IpRateLimiter::new(60, 3);
        assert!(limiter.try_acquire("1.2.3.4"));
        assert!(limiter.try_acquire("1.2.3.4"));
        assert!(limiter.try_acquire("1.2.3.4"));
        assert!(!limiter.try_acquire("1.2.3.4"));
    }

    #[tokio::test(start_paused = true)]
    async fn refills_over_time() {
        let limiter = IpRateLimiter::new(60, 1);
        assert!(limiter.try_acquire("1.2.3.4"));
        assert!(!limiter.try_acquire("1.2.3.4"));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.try_acquire("1.2.3.4"));
    }

    #[tokio::test(start_paused = true)]
    async fn different_ips_are_independent() {
        let limiter = IpRateLimiter::new(60, 1);
        assert!(limiter.try_acquire("1.1.1.1"));
        assert!(limiter.try_acquire("2.2.2.2"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_reclaims_idle_buckets() {
        let limiter = IpRateLimiter::new(60, 1);
        limiter.try_acquire("1.1.1.1");
        assert_eq!(limiter.tracked_clients(), 1);
        tokio::time::advance(DEFAULT_IDLE_AFTER + Duration::from_secs(1)).await;
        assert_eq!(limiter.sweep_idle(), 1);
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
