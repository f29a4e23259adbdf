//! Global API rate limiting
//!
//! A token bucket holding up to `capacity` tokens that refills continuously at
//! `capacity` tokens per window (one hour in production). The bucket starts
//! full. Every network request takes one token right before it is issued, so
//! all concurrent branches of an export share a single ceiling.
//!
//! Waiters are served in arrival order: the bucket lives behind a
//! `tokio::sync::Mutex`, which is fair, and the lock is held while the head
//! waiter sleeps for its token.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Source of time for the limiter
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;

    /// Suspend until `deadline` has passed
    async fn sleep_until(&self, deadline: Instant);
}

/// Wall clock backed by `tokio::time`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
    }
}

// Absorbs float drift from continuous refill
const TOKEN_EPSILON: f64 = 1e-9;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket gate shared by every network-issuing operation
pub struct RateLimiter {
    capacity: f64,
    tokens_per_sec: f64,
    bucket: Mutex<Bucket>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Limiter allowing `calls_per_hour` requests per rolling hour
    pub fn per_hour(calls_per_hour: u32) -> Self {
        Self::with_clock(
            calls_per_hour,
            Duration::from_secs(3600),
            Arc::new(TokioClock),
        )
    }

    /// Limiter with an explicit window and clock
    ///
    /// A zero capacity is treated as one token per window.
    pub fn with_clock(capacity: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = f64::from(capacity.max(1));
        let window_secs = window.as_secs_f64().max(f64::EPSILON);
        let now = clock.now();
        Self {
            capacity,
            tokens_per_sec: capacity / window_secs,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: now,
            }),
            clock,
        }
    }

    /// Waits until a token is available and takes it
    ///
    /// Never fails; it only delays the caller.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        loop {
            let now = self.clock.now();
            self.refill(&mut bucket, now);

            if bucket.tokens + TOKEN_EPSILON >= 1.0 {
                bucket.tokens = (bucket.tokens - 1.0).max(0.0);
                return;
            }

            let missing = 1.0 - bucket.tokens;
            let wait = Duration::from_secs_f64(missing / self.tokens_per_sec);
            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                "Rate limit reached, waiting for token"
            );
            self.clock.sleep_until(now + wait).await;
        }
    }

    /// Tokens currently available, after refilling
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        let now = self.clock.now();
        self.refill(&mut bucket, now);
        bucket.tokens
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        if elapsed.is_zero() {
            return;
        }
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.tokens_per_sec)
            .min(self.capacity);
        bucket.last_refill = now;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("capacity", &self.capacity)
            .field("tokens_per_sec", &self.tokens_per_sec)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::watch;

    /// Clock that only moves when the test says so
    pub(crate) struct ManualClock {
        base: Instant,
        offset: watch::Sender<Duration>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Arc<Self> {
            let (offset, _) = watch::channel(Duration::ZERO);
            Arc::new(Self {
                base: Instant::now(),
                offset,
            })
        }

        pub(crate) fn advance(&self, by: Duration) {
            self.offset.send_modify(|offset| *offset += by);
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.borrow()
        }

        async fn sleep_until(&self, deadline: Instant) {
            let mut rx = self.offset.subscribe();
            while self.base + *rx.borrow_and_update() < deadline {
                if rx.changed().await.is_err() {
                    return;
                }
            }
        }
    }

    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_bucket_starts_full() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(3, Duration::from_secs(3600), clock);
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(limiter.available().await < 1.0);
    }

    #[tokio::test]
    async fn test_capacity_two_releases_rest_only_as_time_advances() {
        let clock = ManualClock::new();
        let limiter = Arc::new(RateLimiter::with_clock(
            2,
            Duration::from_secs(3600),
            clock.clone(),
        ));
        let passed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = limiter.clone();
            let passed = passed.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                passed.fetch_add(1, Ordering::SeqCst);
            }));
        }

        settle().await;
        assert_eq!(passed.load(Ordering::SeqCst), 2);

        // One token drips in every 30 minutes at 2 per hour
        clock.advance(Duration::from_secs(60 * 29));
        settle().await;
        assert_eq!(passed.load(Ordering::SeqCst), 2);

        clock.advance(Duration::from_secs(61));
        settle().await;
        assert_eq!(passed.load(Ordering::SeqCst), 3);

        clock.advance(Duration::from_secs(3600));
        settle().await;
        assert_eq!(passed.load(Ordering::SeqCst), 5);

        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_refill_never_exceeds_capacity() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(2, Duration::from_secs(3600), clock.clone());
        clock.advance(Duration::from_secs(10 * 3600));
        assert_eq!(limiter.available().await, 2.0);
    }

    #[tokio::test]
    async fn test_zero_capacity_treated_as_one() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(0, Duration::from_secs(60), clock);
        limiter.acquire().await;
        assert!(limiter.available().await < 1.0);
    }
}
