//! Domain Entities
//!
//! Core business entities for the step-up verification domain.

use crate::domain::value_objects::{ChallengeCode, Purpose};
use chrono::{DateTime, Utc};
use kernel::id::SubjectId;

/// Challenge entity - a one-time code bound to one subject and purpose
///
/// At most one live (non-consumed, non-expired) challenge exists per
/// (subject, purpose); issuing a new one supersedes the old record.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub subject_id: SubjectId,
    pub purpose: Purpose,
    pub code: ChallengeCode,
    pub issued_at: DateTime<Utc>,
    pub expires_at_ms: i64,
    pub attempts_remaining: i16,
    pub consumed: bool,
}

impl Challenge {
    /// Create a new challenge
    pub fn new(
        subject_id: SubjectId,
        purpose: Purpose,
        code: ChallengeCode,
        ttl_ms: i64,
        max_attempts: i16,
    ) -> Self {
        let now = Utc::now();
        Self {
            subject_id,
            purpose,
            code,
            issued_at: now,
            expires_at_ms: now.timestamp_millis() + ttl_ms,
            attempts_remaining: max_attempts,
            consumed: false,
        }
    }

    /// Check if the challenge has expired
    ///
    /// Expiry is passive; nothing fires on the deadline, readers check it.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }
}
