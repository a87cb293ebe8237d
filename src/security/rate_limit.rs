//! Fixed-window rate limiting for sensitive operations.
//!
//! A window opens on the first attempt for a key and lasts `window_ms`. Every
//! attempt inside the window counts; once `max_attempts` is reached further
//! attempts are refused until the window expires, at which point the next
//! attempt opens a fresh window.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Window length and attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_attempts: u32,
    pub window_ms: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_ms: 15 * 60 * 1000,
        }
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window_ms: config.window_secs.saturating_mul(1000),
        }
    }
}

/// Outcome of a single check. Being refused is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Unix milliseconds at which the current window ends.
    pub reset_at: u64,
}

/// Backing storage for rate-limit windows.
///
/// `hit` must check and count an attempt as one atomic step per key.
pub trait RateLimitStore: Send + Sync {
    fn hit(&self, key: &str, now_ms: u64, policy: &RateLimitPolicy) -> RateLimitDecision;
    fn clear(&self, key: &str);
    /// Drop windows that ended before `now_ms`. Returns how many were removed.
    fn evict_expired(&self, now_ms: u64) -> usize;
    fn len(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: u64,
}

/// Process-local window store.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    windows: DashMap<String, Window>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn hit(&self, key: &str, now_ms: u64, policy: &RateLimitPolicy) -> RateLimitDecision {
        // The entry guard holds the shard lock until we return.
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: 0,
        });
        let window = entry.value_mut();

        if window.count == 0 || now_ms > window.reset_at {
            *window = Window {
                count: 1,
                reset_at: now_ms.saturating_add(policy.window_ms),
            };
            return RateLimitDecision {
                allowed: true,
                remaining: policy.max_attempts.saturating_sub(1),
                reset_at: window.reset_at,
            };
        }

        if window.count >= policy.max_attempts {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: window.reset_at,
            };
        }

        window.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: policy.max_attempts - window.count,
            reset_at: window.reset_at,
        }
    }

    fn clear(&self, key: &str) {
        self.windows.remove(key);
    }

    fn evict_expired(&self, now_ms: u64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| now_ms <= window.reset_at);
        before.saturating_sub(self.windows.len())
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}

/// Rate limiter with an injected store and clock.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Limiter backed by a fresh [`MemoryRateLimitStore`].
    pub fn in_memory(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(MemoryRateLimitStore::new()), policy, clock)
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Count an attempt for `key` and report whether it may proceed.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.store.hit(key, self.clock.now_ms(), &self.policy)
    }

    /// Forget the window for `key`, e.g. after a successful login.
    pub fn reset(&self, key: &str) {
        self.store.clear(key);
    }

    pub fn sweep(&self) -> usize {
        self.store.evict_expired(self.clock.now_ms())
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }

    /// Periodically evict expired windows until shutdown is signalled.
    pub fn spawn_sweeper(
        &self,
        every: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = limiter.sweep();
                        metrics::record_rate_limit_windows(limiter.tracked_keys());
                        if evicted > 0 {
                            tracing::debug!(evicted, "Evicted expired rate limit windows");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate limit sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::lifecycle::Shutdown;

    const WINDOW: u64 = 15 * 60 * 1000;

    fn limiter() -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let limiter = RateLimiter::in_memory(RateLimitPolicy::default(), clock.clone());
        (limiter, clock)
    }

    #[test]
    fn test_cap_then_refuse() {
        let (limiter, _) = limiter();
        for expected_remaining in (0..5).rev() {
            let d = limiter.check("login:ana@example.org");
            assert!(d.allowed);
            assert_eq!(d.remaining, expected_remaining);
        }
        let sixth = limiter.check("login:ana@example.org");
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
    }

    #[test]
    fn test_window_expiry_opens_fresh_window() {
        let (limiter, clock) = limiter();
        let first = limiter.check("k");
        assert_eq!(first.reset_at, 1_000_000 + WINDOW);
        for _ in 0..5 {
            limiter.check("k");
        }
        assert!(!limiter.check("k").allowed);

        // Still inside the window at exactly reset_at.
        clock.set(first.reset_at);
        assert!(!limiter.check("k").allowed);

        clock.advance(1);
        let fresh = limiter.check("k");
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 4);
        assert_eq!(fresh.reset_at, first.reset_at + 1 + WINDOW);
    }

    #[test]
    fn test_oversized_window_saturates() {
        let config = RateLimitConfig {
            window_secs: u64::MAX,
            ..RateLimitConfig::default()
        };
        let policy = RateLimitPolicy::from(&config);
        assert_eq!(policy.window_ms, u64::MAX);

        let limiter = RateLimiter::in_memory(policy, Arc::new(ManualClock::new(1_000_000)));
        let first = limiter.check("k");
        assert!(first.allowed);
        assert_eq!(first.reset_at, u64::MAX);
    }

    #[test]
    fn test_reset_clears_window() {
        let (limiter, _) = limiter();
        for _ in 0..6 {
            limiter.check("k");
        }
        limiter.reset("k");
        let d = limiter.check("k");
        assert!(d.allowed);
        assert_eq!(d.remaining, 4);
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _) = limiter();
        for _ in 0..6 {
            limiter.check("a");
        }
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn test_concurrent_hits_respect_cap() {
        let (limiter, _) = limiter();
        let allowed = std::sync::atomic::AtomicU32::new(0);
        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    for _ in 0..4 {
                        if limiter.check("shared").allowed {
                            allowed.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        }
                    }
                });
            }
        });
        assert_eq!(allowed.load(std::sync::atomic::Ordering::SeqCst), 5);
    }

    #[test]
    fn test_sweep_evicts_only_expired() {
        let (limiter, clock) = limiter();
        limiter.check("old");
        clock.advance(WINDOW / 2);
        limiter.check("new");
        clock.advance(WINDOW / 2 + 1);

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[tokio::test]
    async fn test_sweeper_task_runs_and_stops() {
        let (limiter, clock) = limiter();
        limiter.check("k");
        clock.advance(WINDOW + 1);

        let shutdown = Shutdown::new();
        let handle = limiter.spawn_sweeper(Duration::from_millis(10), shutdown.subscribe());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(limiter.tracked_keys(), 0);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop on shutdown")
            .unwrap();
    }
}
