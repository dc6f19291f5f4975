//! Orchestration queue.
//!
//! These two primitives are kept pure and clock-injected so they're unit-testable: the async
//! wiring in [`crate::provisioner`] and the reconcilers owns the actual `tokio::time::sleep`
//! calls, this module only decides *how long* to wait.

use jiff::{SignedDuration, Timestamp};

/// A token bucket rate limiter.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Timestamp,
}

impl TokenBucket {
    pub fn new(qps: u32, burst: u32, now: Timestamp) -> Self {
        Self {
            capacity: f64::from(burst),
            tokens: f64::from(burst),
            refill_per_sec: f64::from(qps),
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Timestamp) {
        let elapsed = now.duration_since(self.last_refill);
        let elapsed_secs = elapsed.as_secs_f64().max(0.0);
        self.tokens = (self.tokens + elapsed_secs * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Attempts to take one token; returns whether the caller may proceed immediately.
    pub fn try_acquire(&mut self, now: Timestamp) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// How long the caller must wait before a token becomes available.
    pub fn wait_for_token(&self, now: Timestamp) -> std::time::Duration {
        if self.tokens >= 1.0 || self.refill_per_sec <= 0.0 {
            return std::time::Duration::ZERO;
        }
        let elapsed = now.duration_since(self.last_refill).as_secs_f64().max(0.0);
        let available = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        let deficit = (1.0 - available).max(0.0);
        std::time::Duration::from_secs_f64(deficit / self.refill_per_sec)
    }
}

/// Per-object exponential backoff.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: std::time::Duration,
    max: std::time::Duration,
}

impl Backoff {
    pub fn new(base: std::time::Duration, max: std::time::Duration) -> Self {
        Self { base, max }
    }

    /// The delay before the `attempt`-th retry (0-indexed: the first retry after an initial
    /// failure is `attempt == 0`).
    pub fn delay(&self, attempt: u32) -> std::time::Duration {
        let doubled = self.base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        doubled.min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, Duration::from_millis(100))]
    #[case(1, Duration::from_millis(200))]
    #[case(3, Duration::from_millis(800))]
    #[case(20, Duration::from_secs(10))]
    fn backoff_doubles_until_capped(#[case] attempt: u32, #[case] expected: Duration) {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(10));
        assert_eq!(backoff.delay(attempt), expected);
    }

    #[test]
    fn token_bucket_drains_and_refills() {
        let t0: Timestamp = "2024-01-01T00:00:00Z".parse().unwrap();
        let mut bucket = TokenBucket::new(10, 2, t0);

        assert!(bucket.try_acquire(t0));
        assert!(bucket.try_acquire(t0));
        assert!(!bucket.try_acquire(t0), "burst exhausted");

        let later = t0 + SignedDuration::from_secs(1);
        assert!(bucket.try_acquire(later), "refilled after a second at 10qps");
    }
}
