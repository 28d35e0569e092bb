//! # Rate Limiter
//! Sliding-window call log for outbound requests.
//!
//! Holds the instants of the calls made within the last `window` and admits a
//! new call only while fewer than `max_calls` are on record. State lives in
//! the limiter; share it with `Arc` where several clients hit the same quota.

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use tokio::time::Instant;

#[derive(Debug)]
pub struct RateLimiter {
    calls: Mutex<VecDeque<Instant>>,
    max_calls: usize,
    window: Duration,
}

impl RateLimiter {
    /// `max_calls` per `window`. Zero values are bumped to 1 / 1s.
    pub fn new(max_calls: usize, window: Duration) -> Self {
        let max_calls = max_calls.max(1);
        let window = if window.is_zero() {
            Duration::from_secs(1)
        } else {
            window
        };
        Self {
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
            max_calls,
            window,
        }
    }

    /// football-data.org free tier: 10 calls per minute.
    pub fn per_minute(max_calls: usize) -> Self {
        Self::new(max_calls, Duration::from_secs(60))
    }

    /// Record a call at `now` if a slot is free; otherwise return how long
    /// until the oldest call leaves the window.
    pub fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        let mut calls = self.calls.lock().expect("rate limiter mutex poisoned");

        while let Some(&t) = calls.front() {
            if now.saturating_duration_since(t) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }

        if calls.len() < self.max_calls {
            calls.push_back(now);
            return Ok(());
        }

        // Full window: the front entry is the next to expire.
        let oldest = calls.front().copied().unwrap_or(now);
        Err(self.window.saturating_sub(now.saturating_duration_since(oldest)))
    }

    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.try_acquire_at(Instant::now())
    }

    /// Wait (async) until a slot is free, then take it.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => {
                    tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limiter waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Calls currently counted against the window.
    pub fn in_flight_at(&self, now: Instant) -> usize {
        let calls = self.calls.lock().expect("rate limiter mutex poisoned");
        calls
            .iter()
            .filter(|&&t| now.saturating_duration_since(t) < self.window)
            .count()
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_then_reports_wait() {
        let rl = RateLimiter::new(3, Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(rl.try_acquire_at(t0).is_ok());
        assert!(rl.try_acquire_at(t0 + Duration::from_secs(10)).is_ok());
        assert!(rl.try_acquire_at(t0 + Duration::from_secs(20)).is_ok());

        let wait = rl
            .try_acquire_at(t0 + Duration::from_secs(30))
            .unwrap_err();
        assert_eq!(wait, Duration::from_secs(30));
        assert_eq!(rl.in_flight_at(t0 + Duration::from_secs(30)), 3);
    }

    #[test]
    fn window_slides() {
        let rl = RateLimiter::new(2, Duration::from_secs(60));
        let t0 = Instant::now();
        rl.try_acquire_at(t0).unwrap();
        rl.try_acquire_at(t0 + Duration::from_secs(30)).unwrap();
        assert!(rl.try_acquire_at(t0 + Duration::from_secs(59)).is_err());
        // first call expires at t0+60
        assert!(rl.try_acquire_at(t0 + Duration::from_secs(60)).is_ok());
        assert!(rl.try_acquire_at(t0 + Duration::from_secs(61)).is_err());
        assert!(rl.try_acquire_at(t0 + Duration::from_secs(90)).is_ok());
    }

    #[test]
    fn rejected_calls_are_not_recorded() {
        let rl = RateLimiter::new(1, Duration::from_secs(10));
        let t0 = Instant::now();
        rl.try_acquire_at(t0).unwrap();
        for s in 1..10 {
            assert!(rl.try_acquire_at(t0 + Duration::from_secs(s)).is_err());
        }
        assert!(rl.try_acquire_at(t0 + Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn zero_config_is_sanitized() {
        let rl = RateLimiter::new(0, Duration::ZERO);
        assert_eq!(rl.max_calls(), 1);
        assert_eq!(rl.window(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_a_slot() {
        let rl = RateLimiter::new(1, Duration::from_millis(200));
        rl.acquire().await;
        let started = Instant::now();
        rl.acquire().await;
        assert!(started.elapsed() >= Duration::from_millis(150));
    }
}
