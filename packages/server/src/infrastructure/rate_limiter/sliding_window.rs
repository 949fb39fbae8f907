//! Sliding-window connection rate limiter.
//!
//! Every attempt is recorded with its timestamp; an attempt is admitted when
//! the number of attempts from the same address within the last `window`
//! (itself included) does not exceed `max_attempts`. Unlike a fixed bucket,
//! an old attempt stops counting exactly `window` after it was made.
//!
//! A background sweeper evicts idle addresses every `2 x window` so the map
//! does not grow with every address ever seen.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use signalhub_shared::time::{Clock, SystemClock};
use tokio::{sync::watch, task::JoinHandle};

use crate::{config::RateLimitConfig, domain::ConnectionRateLimiter};

pub struct SlidingWindowRateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    /// Attempt timestamps per source address, oldest first
    attempts: Mutex<HashMap<String, VecDeque<Instant>>>,
    shutdown: watch::Sender<bool>,
}

impl SlidingWindowRateLimiter {
    pub fn new(config: RateLimitConfig) -> Arc<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            config,
            clock,
            attempts: Mutex::new(HashMap::new()),
            shutdown,
        })
    }

    /// Spawn the periodic sweeper. It stops on [`close`](Self::close) or once
    /// the limiter itself is dropped.
    pub fn start_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::downgrade(self);
        let mut shutdown = self.shutdown.subscribe();
        let period = self
            .config
            .window
            .saturating_mul(2)
            .max(Duration::from_millis(1));

        tokio::spawn(async move {
            if *shutdown.borrow_and_update() {
                return;
            }
            let Some(first_tick) = tokio::time::Instant::now().checked_add(period) else {
                // no attempt can expire before the clock overflows
                let _ = shutdown.changed().await;
                tracing::debug!("Rate limiter sweeper stopped");
                return;
            };
            let mut ticker = tokio::time::interval_at(first_tick, period);

            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        let Some(limiter) = limiter.upgrade() else {
                            break;
                        };
                        let evicted = limiter.sweep();
                        if evicted > 0 {
                            tracing::debug!("Rate limiter evicted {} idle addresses", evicted);
                        }
                    }
                }
            }
            tracing::debug!("Rate limiter sweeper stopped");
        })
    }

    /// Drop expired attempts everywhere and evict addresses left with none.
    ///
    /// Returns the number of evicted addresses.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let window = self.config.window;
        let mut attempts = self.lock_attempts();
        let before = attempts.len();

        attempts.retain(|_, history| {
            prune_expired(history, now, window);
            !history.is_empty()
        });

        before - attempts.len()
    }

    /// Stop the sweeper. Calling it again has no effect.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    /// Number of addresses currently tracked
    pub fn tracked_addresses(&self) -> usize {
        self.lock_attempts().len()
    }

    fn lock_attempts(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionRateLimiter for SlidingWindowRateLimiter {
    fn is_allowed(&self, address: &str) -> bool {
        let now = self.clock.now();
        let mut attempts = self.lock_attempts();
        let history = attempts.entry(address.to_string()).or_default();

        prune_expired(history, now, self.config.window);
        history.push_back(now);

        history.len() <= self.config.max_attempts
    }
}

fn prune_expired(history: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while history
        .front()
        .is_some_and(|&attempt| now.saturating_duration_since(attempt) >= window)
    {
        history.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalhub_shared::time::ManualClock;

    fn create_test_limiter(
        window: Duration,
        max_attempts: usize,
    ) -> (Arc<SlidingWindowRateLimiter>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = SlidingWindowRateLimiter::with_clock(
            RateLimitConfig::new(window, max_attempts),
            clock.clone(),
        );
        (limiter, clock)
    }

    #[test]
    fn test_sixteenth_attempt_in_default_window_is_rejected() {
        // Test: with the defaults (10s / 15), attempts 1-15 pass and the 16th fails
        // given:
        let (limiter, _clock) = create_test_limiter(Duration::from_secs(10), 15);

        // when:
        let results: Vec<bool> = (0..16).map(|_| limiter.is_allowed("10.0.0.1")).collect();

        // then:
        assert!(results[..15].iter().all(|allowed| *allowed));
        assert!(!results[15]);
    }

    #[test]
    fn test_first_attempt_is_always_allowed() {
        // Test: a first-seen address is admitted
        let (limiter, _clock) = create_test_limiter(Duration::from_secs(10), 1);
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(!limiter.is_allowed("10.0.0.1"));
    }

    #[test]
    fn test_addresses_are_limited_independently() {
        // Test: exhausting one address does not affect another
        // given:
        let (limiter, _clock) = create_test_limiter(Duration::from_secs(10), 2);
        limiter.is_allowed("10.0.0.1");
        limiter.is_allowed("10.0.0.1");

        // when / then:
        assert!(!limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.2"));
    }

    #[test]
    fn test_attempts_expire_after_window() {
        // Test: once the window has passed, old attempts stop counting
        // given:
        let (limiter, clock) = create_test_limiter(Duration::from_secs(10), 3);
        for _ in 0..4 {
            limiter.is_allowed("10.0.0.1");
        }
        assert!(!limiter.is_allowed("10.0.0.1"));

        // when:
        clock.advance(Duration::from_secs(10));

        // then:
        assert!(limiter.is_allowed("10.0.0.1"));
    }

    #[test]
    fn test_rejected_attempts_still_count() {
        // Test: a rejected attempt stays in the window like an admitted one
        // given:
        let (limiter, clock) = create_test_limiter(Duration::from_secs(10), 2);
        limiter.is_allowed("10.0.0.1");
        limiter.is_allowed("10.0.0.1");
        clock.advance(Duration::from_secs(5));
        assert!(!limiter.is_allowed("10.0.0.1"));

        // when:
        clock.advance(Duration::from_millis(5500));
        let after_first_expiry = limiter.is_allowed("10.0.0.1");
        let immediately_after = limiter.is_allowed("10.0.0.1");

        // then:
        // the two attempts at t=0 expired; the rejected one at t=5 still counts
        assert!(after_first_expiry);
        assert!(!immediately_after);
    }

    #[test]
    fn test_steady_rate_is_never_rejected() {
        // Test: one attempt every window/max is always admitted (sliding, not fixed bucket)
        // given:
        let (limiter, clock) = create_test_limiter(Duration::from_secs(10), 5);

        // when / then:
        for attempt in 0..50 {
            assert!(limiter.is_allowed("10.0.0.1"), "attempt {} rejected", attempt);
            clock.advance(Duration::from_secs(2));
        }
    }

    #[test]
    fn test_sweep_evicts_idle_addresses() {
        // Test: sweep removes addresses whose attempts all expired
        // given:
        let (limiter, clock) = create_test_limiter(Duration::from_secs(10), 5);
        limiter.is_allowed("10.0.0.1");
        clock.advance(Duration::from_secs(6));
        limiter.is_allowed("10.0.0.2");
        clock.advance(Duration::from_secs(6));

        // when:
        let evicted = limiter.sweep();

        // then:
        assert_eq!(evicted, 1);
        assert_eq!(limiter.tracked_addresses(), 1);
    }

    #[test]
    fn test_sweep_does_not_change_admission() {
        // Test: sweeping keeps attempts that are still inside the window
        // given:
        let (limiter, _clock) = create_test_limiter(Duration::from_secs(10), 2);
        limiter.is_allowed("10.0.0.1");
        limiter.is_allowed("10.0.0.1");

        // when:
        limiter.sweep();

        // then:
        assert!(!limiter.is_allowed("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_sweeper_evicts_in_background() {
        // Test: the background sweeper evicts expired addresses on its own
        // given:
        let clock = Arc::new(ManualClock::new());
        let limiter = SlidingWindowRateLimiter::with_clock(
            RateLimitConfig::new(Duration::from_millis(20), 5),
            clock.clone(),
        );
        limiter.is_allowed("10.0.0.1");
        clock.advance(Duration::from_millis(20));

        // when:
        let handle = limiter.start_sweeper();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // then:
        assert_eq!(limiter.tracked_addresses(), 0);
        limiter.close();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_stops_sweeper() {
        // Test: close() ends the sweeper task, and a second close is harmless
        // given:
        let (limiter, _clock) = create_test_limiter(Duration::from_secs(10), 5);
        let handle = limiter.start_sweeper();

        // when:
        limiter.close();
        limiter.close();

        // then:
        let finished = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_sweeper_survives_largest_window() {
        // Test: a window of u64::MAX seconds neither panics the sweeper nor blocks close()
        // given:
        let config = RateLimitConfig::from_lookup(|key| {
            (key == crate::config::CONN_WINDOW_ENV).then(|| u64::MAX.to_string())
        });
        assert_eq!(config.window, Duration::from_secs(u64::MAX));
        let limiter = SlidingWindowRateLimiter::new(config);

        // when:
        let handle = limiter.start_sweeper();
        let first = limiter.is_allowed("10.0.0.1");
        limiter.close();

        // then:
        assert!(first);
        let finished = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_sweeper_started_after_close_exits_immediately() {
        // Test: a sweeper started on a closed limiter does not run
        let (limiter, _clock) = create_test_limiter(Duration::from_secs(10), 5);
        limiter.close();
        let handle = limiter.start_sweeper();
        let finished = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }
}
