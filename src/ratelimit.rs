//! Rolling-window request throttling.
//!
//! The throttle admits at most `max_calls` operations in any rolling
//! window of `period`. An admission past the limit suspends the calling
//! task until the oldest admission ages out of the window; it never
//! rejects and never times out, so a caller waits as long as it takes.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Default number of admissions per period
const DEFAULT_MAX_CALLS: usize = 5;

/// Default length of the rolling window
const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Throttle configuration: at most `max_calls` admissions per rolling
/// `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Maximum admissions per period
    #[serde(default = "default_max_calls")]
    pub max_calls: usize,

    /// Length of the rolling window
    #[serde(default = "default_period", with = "humantime_serde")]
    pub period: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_calls: default_max_calls(),
            period: default_period(),
        }
    }
}

/// Default number of admissions per period
const fn default_max_calls() -> usize {
    DEFAULT_MAX_CALLS
}

/// Default length of the rolling window
const fn default_period() -> Duration {
    DEFAULT_PERIOD
}

impl RateLimit {
    /// A rate limit of `max_calls` admissions per `period`
    #[must_use]
    pub const fn new(max_calls: usize, period: Duration) -> Self {
        Self { max_calls, period }
    }
}

/// Shared rolling-window throttle.
///
/// All concurrent tasks of one client go through a single instance.
/// Admission order is unspecified, but the internal lock queues waiters
/// fairly, so no task starves while capacity exists.
#[derive(Debug)]
pub struct Throttle {
    limit: RateLimit,
    /// Admission log, oldest first. Never grows past `limit.max_calls`.
    log: Mutex<VecDeque<Instant>>,
}

impl Throttle {
    /// Create a throttle for the given limit.
    ///
    /// A `max_calls` of zero is treated as one; the throttle delays
    /// admissions, it does not refuse them.
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        let limit = RateLimit {
            max_calls: limit.max_calls.max(1),
            period: limit.period,
        };
        Self {
            limit,
            log: Mutex::new(VecDeque::with_capacity(limit.max_calls)),
        }
    }

    /// Wait until the rolling window has spare capacity, then record the
    /// admission and return.
    pub async fn acquire(&self) {
        loop {
            let wake = {
                let mut log = self.log.lock().await;
                let now = Instant::now();
                while log
                    .front()
                    .is_some_and(|admitted| now - *admitted >= self.limit.period)
                {
                    log.pop_front();
                }
                if log.len() < self.limit.max_calls {
                    log.push_back(now);
                    return;
                }
                log::debug!(
                    "throttle at capacity ({} per {:?}), waiting",
                    self.limit.max_calls,
                    self.limit.period
                );
                let Some(oldest) = log.front().copied() else {
                    return;
                };
                oldest + self.limit.period
            };
            // lock is released here so other tasks can race for the slot
            sleep_until(wake).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    #[test]
    fn test_default_limit() {
        let limit = RateLimit::default();
        assert_eq!(limit.max_calls, 5);
        assert_eq!(limit.period, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_admissions_within_limit_do_not_wait() {
        let throttle = Throttle::new(RateLimit::new(3, Duration::from_secs(1)));
        let start = Instant::now();
        for _ in 0..3 {
            throttle.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission_beyond_limit_waits_for_the_window() {
        let throttle = Throttle::new(RateLimit::new(3, Duration::from_secs(1)));
        let start = Instant::now();
        for _ in 0..4 {
            throttle.acquire().await;
        }
        // the fourth admission cannot land before the first aged out
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_rolls_over() {
        let throttle = Throttle::new(RateLimit::new(2, Duration::from_millis(100)));
        let start = Instant::now();
        for _ in 0..5 {
            throttle.acquire().await;
        }
        // admissions land in pairs: two at 0ms, two at 100ms, one at 200ms
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_tasks_share_one_window() {
        let throttle = Throttle::new(RateLimit::new(2, Duration::from_secs(1)));
        let start = Instant::now();
        join_all((0..4).map(|_| throttle.acquire())).await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_capacity_is_clamped_to_one() {
        let throttle = Throttle::new(RateLimit::new(0, Duration::from_millis(10)));
        throttle.acquire().await;
        throttle.acquire().await;
    }
}
