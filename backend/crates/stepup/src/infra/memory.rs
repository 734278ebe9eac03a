//! In-Memory Repository Implementation
//!
//! Backend for tests and local development. Honors the same atomicity
//! contracts as the PostgreSQL implementation: each operation is one
//! short critical section with no await while a lock is held.

use crate::domain::entities::Challenge;
use crate::domain::repository::{ChallengeRepository, RateLimitRepository, SessionRegistry};
use crate::domain::value_objects::{Purpose, RateLimitAction};
use crate::error::StepUpResult;
use chrono::Utc;
use kernel::id::{SessionId, SubjectId};
use platform::rate_limit::{RateLimitConfig, RateLimitDecision};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
struct Window {
    start_ms: i64,
    count: u32,
}

#[derive(Default)]
struct Inner {
    challenges: Mutex<HashMap<(Uuid, Purpose), Challenge>>,
    windows: Mutex<HashMap<(String, RateLimitAction), Window>>,
    sessions: Mutex<HashMap<Uuid, Uuid>>,
}

/// In-memory backend implementing all repository traits
#[derive(Clone, Default)]
pub struct InMemoryStepUpRepository {
    inner: Arc<Inner>,
}

impl InMemoryStepUpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for a subject (the surrounding application's
    /// sign-in flow does this in production)
    pub fn insert_session(&self, session_id: SessionId, subject_id: &SubjectId) {
        lock(&self.inner.sessions).insert(session_id.into_uuid(), *subject_id.as_uuid());
    }

    pub fn session_count(&self, subject_id: &SubjectId) -> usize {
        lock(&self.inner.sessions)
            .values()
            .filter(|subject| *subject == subject_id.as_uuid())
            .count()
    }
}

// A poisoned lock only means another thread panicked mid-test; the data
// is still usable for these single-value updates.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChallengeRepository for InMemoryStepUpRepository {
    async fn put(&self, challenge: &Challenge) -> StepUpResult<()> {
        let key = (*challenge.subject_id.as_uuid(), challenge.purpose);
        lock(&self.inner.challenges).insert(key, challenge.clone());
        Ok(())
    }

    async fn find(
        &self,
        subject_id: &SubjectId,
        purpose: Purpose,
    ) -> StepUpResult<Option<Challenge>> {
        let key = (*subject_id.as_uuid(), purpose);
        Ok(lock(&self.inner.challenges).get(&key).cloned())
    }

    async fn record_failed_attempt(
        &self,
        subject_id: &SubjectId,
        purpose: Purpose,
    ) -> StepUpResult<i16> {
        let key = (*subject_id.as_uuid(), purpose);
        let mut challenges = lock(&self.inner.challenges);

        let Some(challenge) = challenges.get_mut(&key) else {
            return Ok(0);
        };

        challenge.attempts_remaining -= 1;
        let remaining = challenge.attempts_remaining;
        if remaining <= 0 {
            challenges.remove(&key);
        }

        Ok(remaining.max(0))
    }

    async fn consume(&self, subject_id: &SubjectId, purpose: Purpose) -> StepUpResult<bool> {
        let key = (*subject_id.as_uuid(), purpose);
        let mut challenges = lock(&self.inner.challenges);

        match challenges.get_mut(&key) {
            Some(challenge) if !challenge.consumed => {
                challenge.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, subject_id: &SubjectId, purpose: Purpose) -> StepUpResult<()> {
        let key = (*subject_id.as_uuid(), purpose);
        lock(&self.inner.challenges).remove(&key);
        Ok(())
    }
}

impl RateLimitRepository for InMemoryStepUpRepository {
    async fn check(
        &self,
        identity: &str,
        action: RateLimitAction,
        config: &RateLimitConfig,
    ) -> StepUpResult<RateLimitDecision> {
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = config.window_ms();
        let mut windows = lock(&self.inner.windows);

        let window = windows
            .entry((identity.to_string(), action))
            .or_insert(Window {
                start_ms: now_ms,
                count: 0,
            });

        // Stale windows reset on the access that observes them
        if now_ms >= window.start_ms + window_ms {
            window.start_ms = now_ms;
            window.count = 0;
        }

        if window.count >= config.max_requests {
            let retry_after_ms = (window.start_ms + window_ms - now_ms).max(0) as u64;
            return Ok(RateLimitDecision::Denied {
                retry_after: Duration::from_millis(retry_after_ms),
            });
        }

        window.count += 1;
        Ok(RateLimitDecision::Allowed {
            remaining: config.max_requests - window.count,
        })
    }
}

impl SessionRegistry for InMemoryStepUpRepository {
    async fn invalidate_all(&self, subject_id: &SubjectId) -> StepUpResult<u64> {
        let mut sessions = lock(&self.inner.sessions);
        let before = sessions.len();
        sessions.retain(|_, subject| subject != subject_id.as_uuid());
        Ok((before - sessions.len()) as u64)
    }
}
