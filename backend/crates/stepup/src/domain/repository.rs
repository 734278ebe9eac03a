//! Repository Traits
//!
//! Interfaces for data persistence and external collaborators.
//! Implementations live in the infrastructure layer (or, for delivery and
//! the session registry, in the surrounding application).

use crate::domain::entities::Challenge;
use crate::domain::value_objects::{ChallengeCode, Purpose, RateLimitAction};
use crate::error::StepUpResult;
use kernel::id::SubjectId;
use platform::rate_limit::{RateLimitConfig, RateLimitDecision};

/// Challenge store trait
///
/// Every mutation is atomic per (subject, purpose) key; operations on
/// different keys must not serialize against each other.
#[trait_variant::make(ChallengeRepository: Send)]
pub trait LocalChallengeRepository {
    /// Store a challenge, atomically superseding any prior record for the
    /// same (subject, purpose) key. No reader may observe a half-written
    /// record; the last writer wins.
    async fn put(&self, challenge: &Challenge) -> StepUpResult<()>;

    /// Load the challenge for a key, if any
    async fn find(&self, subject_id: &SubjectId, purpose: Purpose)
    -> StepUpResult<Option<Challenge>>;

    /// Atomically decrement the attempt counter, returning the remaining
    /// count. At zero the challenge becomes permanently invalid and future
    /// reads observe no record.
    async fn record_failed_attempt(
        &self,
        subject_id: &SubjectId,
        purpose: Purpose,
    ) -> StepUpResult<i16>;

    /// Atomically transition `consumed` from false to true. Returns false
    /// when the challenge was already consumed; this is the replay guard,
    /// so exactly one caller ever gets true.
    async fn consume(&self, subject_id: &SubjectId, purpose: Purpose) -> StepUpResult<bool>;

    /// Remove a challenge (lazy expiry reclamation)
    async fn delete(&self, subject_id: &SubjectId, purpose: Purpose) -> StepUpResult<()>;
}

/// Rate limit store trait
#[trait_variant::make(RateLimitRepository: Send)]
pub trait LocalRateLimitRepository {
    /// Check and, only when admitting, increment the (identity, action)
    /// window counter. A denied check mutates nothing.
    async fn check(
        &self,
        identity: &str,
        action: RateLimitAction,
        config: &RateLimitConfig,
    ) -> StepUpResult<RateLimitDecision>;
}

/// Session registry - external collaborator
///
/// Maps subjects to their active sessions. This subsystem never creates
/// sessions; its single requirement is that invalidation be total and
/// immediate across all of a subject's devices.
#[trait_variant::make(SessionRegistry: Send)]
pub trait LocalSessionRegistry {
    /// Destroy every active session for a subject, returning how many
    /// were removed
    async fn invalidate_all(&self, subject_id: &SubjectId) -> StepUpResult<u64>;
}

/// Delivery collaborator - external transport (email/SMS)
///
/// The core decides that a code must be sent and what it is; the
/// transport is someone else's problem.
#[trait_variant::make(CodeDelivery: Send)]
pub trait LocalCodeDelivery {
    async fn send(&self, subject_id: &SubjectId, code: &ChallengeCode) -> Result<(), DeliveryError>;
}

/// Transport failure reported by a delivery collaborator
///
/// Not part of `StepUpError`: a failed send is a successful issuance that
/// went undelivered, and the issuance path decides what to do with it.
#[derive(Debug, thiserror::Error)]
#[error("code delivery failed: {0}")]
pub struct DeliveryError(pub String);
