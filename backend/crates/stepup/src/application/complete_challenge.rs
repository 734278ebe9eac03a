//! Complete Challenge Use Case

use crate::application::config::StepUpConfig;
use crate::domain::repository::ChallengeRepository;
use crate::domain::value_objects::{ChallengeCode, Purpose};
use crate::error::{StepUpError, StepUpResult};
use kernel::id::SubjectId;
use std::sync::Arc;

/// Complete Challenge Use Case
///
/// Evaluates the submitted code against the stored challenge in a fixed
/// order: missing, expired, consumed, mismatch, match. Exactly one
/// completion per challenge can ever succeed; a lost consume race reports
/// `AlreadyUsed`.
pub struct CompleteChallengeUseCase<C>
where
    C: ChallengeRepository,
{
    challenge_repo: Arc<C>,
    config: Arc<StepUpConfig>,
}

impl<C> CompleteChallengeUseCase<C>
where
    C: ChallengeRepository,
{
    pub fn new(challenge_repo: Arc<C>, config: Arc<StepUpConfig>) -> Self {
        Self {
            challenge_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        subject_id: SubjectId,
        purpose: Purpose,
        submitted_code: &str,
    ) -> StepUpResult<()> {
        let challenge = self
            .challenge_repo
            .find(&subject_id, purpose)
            .await?
            .ok_or(StepUpError::ChallengeNotFound)?;

        if challenge.is_expired() {
            // Reclaim lazily so the next completion takes the NotFound path
            self.challenge_repo.delete(&subject_id, purpose).await?;
            tracing::debug!(subject_id = %subject_id, "Challenge expired, reclaimed");
            return Err(StepUpError::ChallengeExpired);
        }

        if challenge.consumed {
            return Err(StepUpError::AlreadyUsed);
        }

        // Shape check before any comparison; malformed input is charged
        // as a failed attempt like any other wrong code.
        let well_formed = ChallengeCode::is_well_formed(submitted_code, self.config.code_len);
        if !well_formed || !challenge.code.matches(submitted_code) {
            let remaining = self
                .challenge_repo
                .record_failed_attempt(&subject_id, purpose)
                .await?;

            if remaining <= 0 {
                tracing::warn!(
                    subject_id = %subject_id,
                    purpose = %purpose,
                    "Challenge invalidated after final failed attempt"
                );
                return Err(StepUpError::AttemptsExhausted);
            }

            return Err(StepUpError::CodeMismatch {
                attempts_remaining: remaining,
            });
        }

        if !self.challenge_repo.consume(&subject_id, purpose).await? {
            // Concurrent completion with the same code won the race
            return Err(StepUpError::AlreadyUsed);
        }

        tracing::info!(
            subject_id = %subject_id,
            purpose = %purpose,
            "Step-up challenge verified"
        );

        Ok(())
    }
}
