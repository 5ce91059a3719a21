use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::RateLimitSettings;

/// Fixed-window budget for one caller class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window }
    }

    /// Budget for session-authenticated agents, keyed by agent id
    pub fn agent(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.agent_max_requests,
            Duration::seconds(settings.agent_window_secs as i64),
        )
    }

    /// Stricter budget for automation API keys, keyed by key prefix
    pub fn automation(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.automation_max_requests,
            Duration::seconds(settings.automation_window_secs as i64),
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug)]
struct WindowCounter {
    window_start: DateTime<Utc>,
    // Window end under the counter's own policy; pruning must use this,
    // not the in-flight caller's window, so counters for a caller class
    // with a longer window are never evicted mid-window
    expires_at: DateTime<Utc>,
    count: u32,
}

/// Per-identifier fixed-window counters.
///
/// Held in shared app state and injected into middleware rather than living
/// as a module singleton, so tests can reset it deterministically. The mutex
/// makes increment-and-compare atomic across in-flight requests.
#[derive(Debug, Default)]
pub struct RateLimiter {
    counters: Mutex<HashMap<String, WindowCounter>>,
}

// Drop expired counters once the map grows past this many identifiers
const PRUNE_THRESHOLD: usize = 4096;

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one call against `identifier` and report whether it fits in the
    /// current window. The check itself consumes budget: rejected calls are
    /// counted too.
    pub fn check(&self, identifier: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        self.check_at(identifier, policy, Utc::now())
    }

    fn check_at(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());

        if counters.len() > PRUNE_THRESHOLD {
            counters.retain(|_, c| now < c.expires_at);
        }

        let counter = counters.entry(identifier.to_string()).or_insert(WindowCounter {
            window_start: now,
            expires_at: now + policy.window,
            count: 0,
        });

        if now >= counter.expires_at {
            counter.window_start = now;
            counter.expires_at = now + policy.window;
            counter.count = 0;
        }

        counter.count += 1;
        let allowed = counter.count <= policy.max_requests;

        RateLimitDecision {
            allowed,
            remaining: policy.max_requests.saturating_sub(counter.count),
            reset_at: counter.expires_at,
        }
    }

    /// Clear all counters (used between tests)
    pub fn reset(&self) {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RateLimitPolicy {
        RateLimitPolicy::new(5, Duration::milliseconds(60_000))
    }

    #[test]
    fn allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        for i in 0..5 {
            let d = limiter.check_at("key-a", &policy(), now);
            assert!(d.allowed, "call {} should be allowed", i + 1);
        }

        let sixth = limiter.check_at("key-a", &policy(), now);
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
        assert!(sixth.reset_at > now);
    }

    #[test]
    fn window_elapse_resets_counter() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        for _ in 0..6 {
            limiter.check_at("key-b", &policy(), now);
        }
        assert!(!limiter.check_at("key-b", &policy(), now).allowed);

        let later = now + Duration::milliseconds(60_001);
        let d = limiter.check_at("key-b", &policy(), later);
        assert!(d.allowed);
        assert_eq!(d.remaining, 4);
    }

    #[test]
    fn identifiers_are_independent() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        for _ in 0..6 {
            limiter.check_at("busy", &policy(), now);
        }
        assert!(!limiter.check_at("busy", &policy(), now).allowed);
        assert!(limiter.check_at("quiet", &policy(), now).allowed);
    }

    #[test]
    fn rejected_checks_still_consume_budget() {
        let limiter = RateLimiter::new();
        let now = Utc::now();
        let p = RateLimitPolicy::new(1, Duration::milliseconds(60_000));

        assert!(limiter.check_at("key-c", &p, now).allowed);
        assert!(!limiter.check_at("key-c", &p, now).allowed);
        // Still inside the window, still counting
        assert!(!limiter.check_at("key-c", &p, now).allowed);
    }

    #[test]
    fn pruning_respects_each_counters_own_window() {
        let limiter = RateLimiter::new();
        let now = Utc::now();
        let short = RateLimitPolicy::new(5, Duration::milliseconds(10));
        let long = RateLimitPolicy::new(2, Duration::minutes(60));

        // Exhaust a long-window identifier
        for _ in 0..3 {
            limiter.check_at("slow-lane", &long, now);
        }
        assert!(!limiter.check_at("slow-lane", &long, now).allowed);

        // Flood enough short-window identifiers to trigger pruning well
        // after their windows have ended
        for i in 0..=PRUNE_THRESHOLD {
            limiter.check_at(&format!("burst-{}", i), &short, now);
        }
        let later = now + Duration::seconds(1);
        limiter.check_at("trigger", &short, later);

        // The long-window counter is still mid-window and must survive
        assert!(!limiter.check_at("slow-lane", &long, later).allowed);
        assert!(limiter.counters.lock().unwrap().len() < PRUNE_THRESHOLD);
    }

    #[test]
    fn reset_clears_state() {
        let limiter = RateLimiter::new();
        let now = Utc::now();
        for _ in 0..6 {
            limiter.check_at("key-d", &policy(), now);
        }
        limiter.reset();
        assert!(limiter.check_at("key-d", &policy(), now).allowed);
    }

    #[test]
    fn concurrent_increments_do_not_lose_updates() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new());
        let p = RateLimitPolicy::new(1000, Duration::milliseconds(60_000));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    limiter.check("shared", &p);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // 400 calls consumed; the next decision must see all of them
        let d = limiter.check("shared", &p);
        assert_eq!(d.remaining, 1000 - 401);
    }
}
