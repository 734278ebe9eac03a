//! Rate Limiting Infrastructure
//!
//! Common rate limiting abstractions shared by storage backends.

use std::time::Duration;

/// Rate limit configuration for one action
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Outcome of a rate limit check
///
/// Denial is a normal outcome callers branch on, not an error; only
/// storage unavailability surfaces as an error from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request admitted; the counter was incremented
    Allowed {
        /// Requests left in the current window
        remaining: u32,
    },
    /// Limit reached; no state was mutated
    Denied {
        /// Time until the current window resets
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }

    /// Retry-after for denied decisions, `None` when allowed
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RateLimitDecision::Allowed { .. } => None,
            RateLimitDecision::Denied { retry_after } => Some(*retry_after),
        }
    }
}
