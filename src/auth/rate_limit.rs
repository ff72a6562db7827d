// auth/rate_limit.rs - Fixed-window request counters keyed by route and client
//
// All counters live behind one mutex. The lock is only held for the
// read-modify-write of a single window and never across an await point, so
// concurrent requests on the same key are serialized without lost updates.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::AuthError;

/// Limit for one gated route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Maximum admitted requests per window
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitRule {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window }
    }
}

/// Outcome of an admitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

struct Window {
    count: u32,
    window_start: Instant,
    window: Duration,
}

/// Keyed request counters for gated routes
#[derive(Default)]
pub struct RateLimiter {
    rules: HashMap<String, RateLimitRule>,
    windows: Mutex<HashMap<(String, String), Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate `route_key` with `rule`.
    pub fn with_rule(mut self, route_key: impl Into<String>, rule: RateLimitRule) -> Self {
        self.rules.insert(route_key.into(), rule);
        self
    }

    pub fn rule(&self, route_key: &str) -> Option<RateLimitRule> {
        self.rules.get(route_key).copied()
    }

    /// Count a request from `client_key` against `route_key`.
    ///
    /// Routes without a rule are always admitted.
    pub fn admit(&self, route_key: &str, client_key: &str) -> Result<Admission, AuthError> {
        self.admit_at(route_key, client_key, Instant::now())
    }

    fn admit_at(&self, route_key: &str, client_key: &str, now: Instant) -> Result<Admission, AuthError> {
        let Some(rule) = self.rule(route_key) else {
            return Ok(Admission {
                limit: u32::MAX,
                remaining: u32::MAX,
                reset_after: Duration::ZERO,
            });
        };

        let mut windows = self.windows.lock();
        let entry = windows
            .entry((route_key.to_string(), client_key.to_string()))
            .or_insert(Window {
                count: 0,
                window_start: now,
                window: rule.window,
            });

        if now.duration_since(entry.window_start) >= rule.window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count = entry.count.saturating_add(1);

        let reset_after = (entry.window_start + rule.window).saturating_duration_since(now);
        if entry.count > rule.max_requests {
            debug!("Rate limit hit on {} for {} ({} requests)", route_key, client_key, entry.count);
            return Err(AuthError::TooManyRequests { retry_after: reset_after });
        }

        Ok(Admission {
            limit: rule.max_requests,
            remaining: rule.max_requests - entry.count,
            reset_after,
        })
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.window_start) < w.window);
        before - windows.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().len()
    }

    /// Periodically purge elapsed windows in the background.
    pub fn spawn_janitor(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = limiter.purge_expired();
                if removed > 0 {
                    debug!("Purged {} expired rate limit windows", removed);
                }
            }
        })
    }
}
