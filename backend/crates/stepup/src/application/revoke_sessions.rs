//! Revoke Sessions Use Case
//!
//! Bulk session invalidation ("sign out on all devices"). Exposed as a
//! capability the application invokes after verification; never triggered
//! automatically by a successful completion.

use crate::domain::repository::SessionRegistry;
use crate::error::StepUpResult;
use kernel::id::SubjectId;
use std::sync::Arc;

/// Revoke Sessions Use Case
pub struct RevokeSessionsUseCase<S>
where
    S: SessionRegistry,
{
    registry: Arc<S>,
}

impl<S> RevokeSessionsUseCase<S>
where
    S: SessionRegistry,
{
    pub fn new(registry: Arc<S>) -> Self {
        Self { registry }
    }

    /// Invalidate every active session for the subject, on every device
    pub async fn execute(&self, subject_id: SubjectId) -> StepUpResult<u64> {
        let revoked = self.registry.invalidate_all(&subject_id).await?;

        tracing::info!(
            subject_id = %subject_id,
            revoked,
            "All sessions invalidated"
        );

        Ok(revoked)
    }
}
