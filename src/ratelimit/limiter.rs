//! Core login rate limiter implementation.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::RateLimitSettings;
use crate::error::{Result, TradepostError};

use super::attempts::AttemptStore;

/// Failed attempts allowed before a key is blocked, when not configured.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default fixed failure window.
const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Bounds the rate of failed login attempts per client key using a fixed
/// failure window.
///
/// Once the window elapses since the first failure in it, the next access
/// treats the key as having no history. This is cheaper than a sliding
/// window and sufficient for abuse deterrence, at the cost of allowing up
/// to `2 * max_attempts - 1` failures across a window boundary.
///
/// State is in-memory and process-local; a restart clears it. This struct
/// is thread-safe and can be shared across multiple tasks.
pub struct LoginRateLimiter {
    attempts: AttemptStore,
    max_attempts: u32,
    window: Duration,
}

impl LoginRateLimiter {
    /// Create a limiter with the default window and attempt cap.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW)
    }

    /// Create a limiter with an explicit attempt cap and window.
    pub fn with_limits(max_attempts: u32, window: Duration) -> Self {
        Self {
            attempts: AttemptStore::new(),
            max_attempts,
            window,
        }
    }

    /// Create a limiter from configuration.
    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::with_limits(settings.max_attempts, settings.window())
    }

    /// Check whether a key is currently blocked.
    ///
    /// Returns `Some(retry_after)` when the key has reached the attempt cap
    /// within an open window, `None` otherwise. Never mutates state: a
    /// record whose window has lapsed reads as no history.
    pub fn is_blocked(&self, key: &str) -> Option<Duration> {
        let rec = self.attempts.get(key)?;
        let now = Instant::now();

        if rec.lapsed(self.window, now) {
            return None;
        }

        if rec.failures >= self.max_attempts {
            let retry_after = rec.remaining(self.window, now);
            trace!(key = %key, ?retry_after, "Login attempt blocked");
            return Some(retry_after);
        }

        None
    }

    /// [`is_blocked`](Self::is_blocked) expressed against the error taxonomy,
    /// for callers that thread a `Result` through the login flow.
    pub fn check(&self, key: &str) -> Result<()> {
        match self.is_blocked(key) {
            Some(retry_after) => Err(TradepostError::RateLimited { retry_after }),
            None => Ok(()),
        }
    }

    /// Record one failed login attempt for a key.
    ///
    /// A single atomic upsert: a missing or lapsed record starts a fresh
    /// window at count 1, otherwise the count increments in place. There is
    /// an accepted check-then-act gap between a caller's block check and
    /// this call; two concurrent failures can both pass the check before
    /// either registers.
    pub fn register_failure(&self, key: &str) {
        let rec = self.attempts.record_failure(key, self.window);
        if rec.failures == self.max_attempts {
            debug!(
                key = %key,
                failures = rec.failures,
                window = ?self.window,
                "Client key blocked after repeated login failures"
            );
        }
    }

    /// Record a successful login, clearing any failure history for the key.
    pub fn register_success(&self, key: &str) {
        self.attempts.clear(key);
        trace!(key = %key, "Login failure history cleared");
    }

    /// Drop records whose window has lapsed. Housekeeping only.
    pub fn prune(&self) {
        self.attempts.prune(self.window);
    }

    /// Number of client keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.attempts.len()
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a client key from a network origin and an account identifier.
///
/// Follows the `ip:email` convention; the identifier is trimmed and
/// lowercased so that equivalent logins share one failure window.
pub fn client_key(origin: &str, identifier: &str) -> String {
    format!("{}:{}", origin, identifier.trim().to_lowercase())
}
