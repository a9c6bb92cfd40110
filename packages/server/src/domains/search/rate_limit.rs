//! Per-host, per-caller sliding window rate limiting.
//!
//! Each `(host, caller IP)` pair keeps the timestamps of its admitted requests
//! over the last window. A request is admitted while fewer than `limit`
//! timestamps remain in the window.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::common::ProviderId;

/// Keys are swept once the map grows past this many entries.
const SWEEP_THRESHOLD: usize = 10_000;

type RateKey = (ProviderId, Option<IpAddr>);

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp (seconds) at which a slot frees up
    pub reset_at: u64,
}

pub struct SlidingWindowLimiter {
    window: Duration,
    entries: Mutex<HashMap<RateKey, VecDeque<Instant>>>,
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::per_minute()
    }
}

impl SlidingWindowLimiter {
    pub fn per_minute() -> Self {
        Self::with_window(Duration::from_secs(60))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Records the request if it is admitted.
    pub fn check(&self, host: ProviderId, ip: Option<IpAddr>, limit: u32) -> RateDecision {
        self.check_at(host, ip, limit, Instant::now())
    }

    fn check_at(
        &self,
        host: ProviderId,
        ip: Option<IpAddr>,
        limit: u32,
        now: Instant,
    ) -> RateDecision {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if entries.len() > SWEEP_THRESHOLD {
            let window = self.window;
            entries.retain(|_, hits| {
                hits.back()
                    .is_some_and(|last| now.saturating_duration_since(*last) < window)
            });
        }

        let hits = entries.entry((host, ip)).or_default();
        while hits
            .front()
            .is_some_and(|first| now.saturating_duration_since(*first) >= self.window)
        {
            hits.pop_front();
        }

        let used = u32::try_from(hits.len()).unwrap_or(u32::MAX);
        let allowed = used < limit;
        if allowed {
            hits.push_back(now);
        }

        let remaining = limit.saturating_sub(used + u32::from(allowed));
        let reset_in = hits
            .front()
            .map(|first| self.window.saturating_sub(now.saturating_duration_since(*first)))
            .unwrap_or(self.window);

        RateDecision {
            allowed,
            limit,
            remaining,
            reset_at: epoch_secs_after(reset_in),
        }
    }
}

fn epoch_secs_after(delay: Duration) -> u64 {
    let at = SystemTime::now() + delay;
    let since_epoch = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    // round up so clients never retry a moment too early
    since_epoch.as_secs() + u64::from(since_epoch.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> Option<IpAddr> {
        Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, last)))
    }

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let limiter = SlidingWindowLimiter::per_minute();
        let host = ProviderId::new();
        let start = Instant::now();

        let first = limiter.check_at(host, ip(1), 2, start);
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);

        let second = limiter.check_at(host, ip(1), 2, start + Duration::from_secs(1));
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);

        let third = limiter.check_at(host, ip(1), 2, start + Duration::from_secs(2));
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert_eq!(third.limit, 2);
    }

    #[test]
    fn test_window_slides() {
        let limiter = SlidingWindowLimiter::per_minute();
        let host = ProviderId::new();
        let start = Instant::now();

        assert!(limiter.check_at(host, ip(1), 1, start).allowed);
        assert!(!limiter.check_at(host, ip(1), 1, start + Duration::from_secs(59)).allowed);
        assert!(limiter.check_at(host, ip(1), 1, start + Duration::from_secs(60)).allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = SlidingWindowLimiter::per_minute();
        let host = ProviderId::new();
        let other_host = ProviderId::new();
        let now = Instant::now();

        assert!(limiter.check_at(host, ip(1), 1, now).allowed);
        assert!(limiter.check_at(host, ip(2), 1, now).allowed);
        assert!(limiter.check_at(other_host, ip(1), 1, now).allowed);
        assert!(limiter.check_at(host, None, 1, now).allowed);
        assert!(!limiter.check_at(host, ip(1), 1, now).allowed);
    }

    #[test]
    fn test_rejected_requests_do_not_consume_slots() {
        let limiter = SlidingWindowLimiter::per_minute();
        let host = ProviderId::new();
        let start = Instant::now();

        assert!(limiter.check_at(host, ip(1), 1, start).allowed);
        for offset in 1..10 {
            assert!(!limiter.check_at(host, ip(1), 1, start + Duration::from_secs(offset)).allowed);
        }
        assert!(limiter.check_at(host, ip(1), 1, start + Duration::from_secs(61)).allowed);
    }

    #[test]
    fn test_reset_is_in_the_future() {
        let limiter = SlidingWindowLimiter::per_minute();
        let decision = limiter.check(ProviderId::new(), ip(1), 5);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        assert!(decision.reset_at > now);
        assert!(decision.reset_at <= now + 61);
    }
}
