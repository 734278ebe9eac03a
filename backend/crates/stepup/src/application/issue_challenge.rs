//! Issue Challenge Use Case

use crate::application::config::StepUpConfig;
use crate::domain::entities::Challenge;
use crate::domain::repository::{ChallengeRepository, CodeDelivery, RateLimitRepository};
use crate::domain::value_objects::{ChallengeCode, Purpose, RateLimitAction};
use crate::error::{StepUpError, StepUpResult};
use kernel::id::SubjectId;
use platform::rate_limit::RateLimitDecision;
use std::sync::Arc;

/// Output DTO for issue challenge
#[derive(Debug, Clone)]
pub struct IssueChallengeOutput {
    pub expires_at_ms: i64,
    /// False when the transport collaborator failed; the challenge stays
    /// active so the code can be redelivered or superseded.
    pub delivered: bool,
}

/// Issue Challenge Use Case
///
/// Rate-limit gate, then atomic create/supersede, then delivery hand-off.
/// A denied gate creates nothing and sends nothing.
pub struct IssueChallengeUseCase<C, R, D>
where
    C: ChallengeRepository,
    R: RateLimitRepository,
    D: CodeDelivery,
{
    challenge_repo: Arc<C>,
    rate_limit_repo: Arc<R>,
    delivery: Arc<D>,
    config: Arc<StepUpConfig>,
}

impl<C, R, D> IssueChallengeUseCase<C, R, D>
where
    C: ChallengeRepository,
    R: RateLimitRepository,
    D: CodeDelivery,
{
    pub fn new(
        challenge_repo: Arc<C>,
        rate_limit_repo: Arc<R>,
        delivery: Arc<D>,
        config: Arc<StepUpConfig>,
    ) -> Self {
        Self {
            challenge_repo,
            rate_limit_repo,
            delivery,
            config,
        }
    }

    pub async fn execute(
        &self,
        subject_id: SubjectId,
        purpose: Purpose,
    ) -> StepUpResult<IssueChallengeOutput> {
        let action = RateLimitAction::IssueCode;
        let decision = self
            .rate_limit_repo
            .check(
                &subject_id.to_string(),
                action,
                self.config.rate_limit(action),
            )
            .await?;

        if let RateLimitDecision::Denied { retry_after } = decision {
            return Err(StepUpError::RateLimited { retry_after });
        }

        let code = ChallengeCode::generate(self.config.code_len);
        let challenge = Challenge::new(
            subject_id,
            purpose,
            code,
            self.config.challenge_ttl_ms(),
            self.config.max_attempts,
        );

        // Supersedes any outstanding challenge for this (subject, purpose);
        // re-requesting a code is not an error.
        self.challenge_repo.put(&challenge).await?;

        let delivered = match self.delivery.send(&subject_id, &challenge.code).await {
            Ok(()) => true,
            Err(e) => {
                // Undelivered, not failed: the challenge stays active and
                // the next issuance within the window resends.
                tracing::warn!(
                    subject_id = %subject_id,
                    error = %e,
                    "Code delivery failed, challenge left active"
                );
                false
            }
        };

        tracing::info!(
            subject_id = %subject_id,
            purpose = %purpose,
            delivered,
            "Issued step-up challenge"
        );

        Ok(IssueChallengeOutput {
            expires_at_ms: challenge.expires_at_ms,
            delivered,
        })
    }
}
