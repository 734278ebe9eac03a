//! PostgreSQL Repository Implementations
//!
//! All per-key atomicity comes from single SQL statements (upserts and
//! conditional UPDATE/DELETE), so concurrent operations on different keys
//! never serialize against each other and no lock spans a round trip.

use crate::domain::entities::Challenge;
use crate::domain::repository::{ChallengeRepository, RateLimitRepository, SessionRegistry};
use crate::domain::value_objects::{ChallengeCode, Purpose, RateLimitAction};
use crate::error::{StepUpError, StepUpResult};
use chrono::Utc;
use kernel::id::SubjectId;
use platform::rate_limit::{RateLimitConfig, RateLimitDecision};
use sqlx::PgPool;
use std::time::Duration;

const OLD_WINDOW_MS: i64 = 3600_000; // 1 hour

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgStepUpRepository {
    pool: PgPool,
}

impl PgStepUpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up dead records (expired/consumed challenges, stale windows)
    ///
    /// Correctness never depends on this sweep; expiry is checked on
    /// every read. It only reclaims storage.
    pub async fn cleanup_expired(&self) -> StepUpResult<(u64, u64)> {
        let now_ms = Utc::now().timestamp_millis();
        let old_window_ms = now_ms - OLD_WINDOW_MS;

        let challenges_deleted =
            sqlx::query("DELETE FROM step_up_challenges WHERE expires_at_ms < $1 OR consumed")
                .bind(now_ms)
                .execute(&self.pool)
                .await?
                .rows_affected();

        let windows_deleted = sqlx::query("DELETE FROM rate_limit_windows WHERE window_start_ms < $1")
            .bind(old_window_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(
            challenges = challenges_deleted,
            windows = windows_deleted,
            "Cleaned up expired step-up data"
        );

        Ok((challenges_deleted, windows_deleted))
    }
}

impl ChallengeRepository for PgStepUpRepository {
    async fn put(&self, challenge: &Challenge) -> StepUpResult<()> {
        sqlx::query(
            r#"
            INSERT INTO step_up_challenges (
                subject_id,
                purpose,
                code,
                issued_at,
                expires_at_ms,
                attempts_remaining,
                consumed
            ) VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            ON CONFLICT (subject_id, purpose) DO UPDATE SET
                code = EXCLUDED.code,
                issued_at = EXCLUDED.issued_at,
                expires_at_ms = EXCLUDED.expires_at_ms,
                attempts_remaining = EXCLUDED.attempts_remaining,
                consumed = FALSE
            "#,
        )
        .bind(challenge.subject_id.as_uuid())
        .bind(challenge.purpose.as_str())
        .bind(challenge.code.as_str())
        .bind(challenge.issued_at)
        .bind(challenge.expires_at_ms)
        .bind(challenge.attempts_remaining)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            subject_id = %challenge.subject_id,
            purpose = %challenge.purpose,
            "Challenge stored"
        );

        Ok(())
    }

    async fn find(
        &self,
        subject_id: &SubjectId,
        purpose: Purpose,
    ) -> StepUpResult<Option<Challenge>> {
        let row = sqlx::query_as::<_, ChallengeRow>(
            r#"
            SELECT
                subject_id,
                purpose,
                code,
                issued_at,
                expires_at_ms,
                attempts_remaining,
                consumed
            FROM step_up_challenges
            WHERE subject_id = $1 AND purpose = $2
            "#,
        )
        .bind(subject_id.as_uuid())
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ChallengeRow::into_challenge).transpose()
    }

    async fn record_failed_attempt(
        &self,
        subject_id: &SubjectId,
        purpose: Purpose,
    ) -> StepUpResult<i16> {
        let remaining = sqlx::query_scalar::<_, i16>(
            r#"
            UPDATE step_up_challenges
            SET attempts_remaining = attempts_remaining - 1
            WHERE subject_id = $1 AND purpose = $2 AND attempts_remaining > 0
            RETURNING attempts_remaining
            "#,
        )
        .bind(subject_id.as_uuid())
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?
        // Row already removed by a racing exhaustion or sweep
        .unwrap_or(0);

        if remaining <= 0 {
            // Exhausted challenges read as NotFound from here on
            sqlx::query("DELETE FROM step_up_challenges WHERE subject_id = $1 AND purpose = $2")
                .bind(subject_id.as_uuid())
                .bind(purpose.as_str())
                .execute(&self.pool)
                .await?;

            tracing::warn!(subject_id = %subject_id, "Challenge attempts exhausted");
        }

        Ok(remaining)
    }

    async fn consume(&self, subject_id: &SubjectId, purpose: Purpose) -> StepUpResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE step_up_challenges
            SET consumed = TRUE
            WHERE subject_id = $1 AND purpose = $2 AND consumed = FALSE
            "#,
        )
        .bind(subject_id.as_uuid())
        .bind(purpose.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 1 {
            tracing::info!(subject_id = %subject_id, "Challenge consumed");
        }

        Ok(updated == 1)
    }

    async fn delete(&self, subject_id: &SubjectId, purpose: Purpose) -> StepUpResult<()> {
        sqlx::query("DELETE FROM step_up_challenges WHERE subject_id = $1 AND purpose = $2")
            .bind(subject_id.as_uuid())
            .bind(purpose.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl RateLimitRepository for PgStepUpRepository {
    async fn check(
        &self,
        identity: &str,
        action: RateLimitAction,
        config: &RateLimitConfig,
    ) -> StepUpResult<RateLimitDecision> {
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = config.window_ms();
        let window_start = (now_ms / window_ms) * window_ms;

        // Conditional upsert: the increment only happens while the counter
        // is under the limit, so a denied check leaves no trace.
        let count = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO rate_limit_windows (identity, action, window_start_ms, request_count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (identity, action, window_start_ms)
            DO UPDATE SET request_count = rate_limit_windows.request_count + 1
            WHERE rate_limit_windows.request_count < $4
            RETURNING request_count
            "#,
        )
        .bind(identity)
        .bind(action.as_str())
        .bind(window_start)
        .bind(config.max_requests as i32)
        .fetch_optional(&self.pool)
        .await?;

        match count {
            Some(count) => Ok(RateLimitDecision::Allowed {
                remaining: config.max_requests.saturating_sub(count as u32),
            }),
            None => {
                let retry_after_ms = (window_start + window_ms - now_ms).max(0) as u64;
                tracing::warn!(
                    identity,
                    action = action.as_str(),
                    max = config.max_requests,
                    "Rate limit exceeded"
                );
                Ok(RateLimitDecision::Denied {
                    retry_after: Duration::from_millis(retry_after_ms),
                })
            }
        }
    }
}

impl SessionRegistry for PgStepUpRepository {
    async fn invalidate_all(&self, subject_id: &SubjectId) -> StepUpResult<u64> {
        let deleted = sqlx::query("DELETE FROM admin_sessions WHERE subject_id = $1")
            .bind(subject_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(subject_id = %subject_id, deleted, "Admin sessions deleted");

        Ok(deleted)
    }
}

// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct ChallengeRow {
    subject_id: uuid::Uuid,
    purpose: String,
    code: String,
    issued_at: chrono::DateTime<Utc>,
    expires_at_ms: i64,
    attempts_remaining: i16,
    consumed: bool,
}

impl ChallengeRow {
    fn into_challenge(self) -> StepUpResult<Challenge> {
        let purpose: Purpose = self
            .purpose
            .parse()
            .map_err(|e: crate::domain::value_objects::UnknownPurpose| {
                StepUpError::Internal(e.to_string())
            })?;

        Ok(Challenge {
            subject_id: SubjectId::from_uuid(self.subject_id),
            purpose,
            code: ChallengeCode::from_stored(self.code),
            issued_at: self.issued_at,
            expires_at_ms: self.expires_at_ms,
            attempts_remaining: self.attempts_remaining,
            consumed: self.consumed,
        })
    }
}
