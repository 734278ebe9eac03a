//! Application Configuration
//!
//! Configuration for the step-up application layer.

use crate::domain::value_objects::RateLimitAction;
use platform::rate_limit::RateLimitConfig;
use std::time::Duration;

/// Step-up application configuration
#[derive(Debug, Clone)]
pub struct StepUpConfig {
    /// Verification code length in digits
    pub code_len: usize,
    /// Challenge TTL
    pub challenge_ttl: Duration,
    /// Wrong-code attempts before a challenge is invalidated
    pub max_attempts: i16,
    /// Rate limit for the "otp" action (code issuance)
    pub issue_rate_limit: RateLimitConfig,
    /// Cookie carrying the admin session token
    pub session_cookie_name: String,
    /// Secret verifying session token signatures (32 bytes)
    pub session_secret: [u8; 32],
}

impl Default for StepUpConfig {
    fn default() -> Self {
        Self {
            code_len: 6,
            challenge_ttl: Duration::from_secs(600),
            max_attempts: 5,
            issue_rate_limit: RateLimitConfig::new(5, 900),
            session_cookie_name: "admin_session".to_string(),
            session_secret: [0u8; 32],
        }
    }
}

impl StepUpConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    pub fn challenge_ttl_ms(&self) -> i64 {
        self.challenge_ttl.as_millis() as i64
    }

    /// Window configuration for a rate-limited action
    pub fn rate_limit(&self, action: RateLimitAction) -> &RateLimitConfig {
        match action {
            RateLimitAction::IssueCode => &self.issue_rate_limit,
        }
    }
}
