//! Delivery Collaborator Stand-In
//!
//! Real transports (email/SMS) live outside this subsystem and implement
//! [`CodeDelivery`](crate::domain::repository::CodeDelivery) themselves.
//! This stand-in logs instead of sending, for development and tests.

use crate::domain::repository::{CodeDelivery, DeliveryError};
use crate::domain::value_objects::ChallengeCode;
use kernel::id::SubjectId;

/// Logs delivery instead of performing it
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCodeDelivery;

impl CodeDelivery for TracingCodeDelivery {
    async fn send(
        &self,
        subject_id: &SubjectId,
        code: &ChallengeCode,
    ) -> Result<(), DeliveryError> {
        tracing::info!(subject_id = %subject_id, "Verification code handed to delivery");
        // The code itself only at debug, for local runs
        tracing::debug!(code = code.as_str(), "Verification code (development)");
        Ok(())
    }
}
