//! Step-Up Error Types
//!
//! Domain-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.
//!
//! Every variant except `Database` and `Internal` is an expected,
//! user-facing outcome; callers branch on them rather than treating them
//! as faults.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use std::time::Duration;
use thiserror::Error;

/// Step-up specific result type alias
pub type StepUpResult<T> = Result<T, StepUpError>;

/// One message for every code-entry failure. Distinguishing "wrong code"
/// from "rate limited", "exhausted" or "no such challenge" would hand an
/// attacker an enumeration oracle.
const NEUTRAL_CODE_MESSAGE: &str =
    "That code is incorrect or no longer valid. Request a new code and try again.";

/// Step-up verification error variants
#[derive(Debug, Error)]
pub enum StepUpError {
    /// Issuance denied by the rate limiter
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// No active challenge for the subject (never issued, swept, or exhausted)
    #[error("Challenge not found")]
    ChallengeNotFound,

    /// Challenge TTL elapsed
    #[error("Challenge expired")]
    ChallengeExpired,

    /// Challenge already consumed by an earlier completion
    #[error("Challenge already used")]
    AlreadyUsed,

    /// Submitted code does not match
    #[error("Code mismatch, {attempts_remaining} attempts remaining")]
    CodeMismatch { attempts_remaining: i16 },

    /// Final allowed attempt failed; challenge is now invalid
    #[error("Verification attempts exhausted")]
    AttemptsExhausted,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StepUpError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            StepUpError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            StepUpError::ChallengeNotFound
            | StepUpError::ChallengeExpired
            | StepUpError::AttemptsExhausted => StatusCode::GONE,
            StepUpError::AlreadyUsed | StepUpError::CodeMismatch { .. } => StatusCode::CONFLICT,
            StepUpError::Database(_) | StepUpError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StepUpError::RateLimited { .. } => ErrorKind::TooManyRequests,
            StepUpError::ChallengeNotFound
            | StepUpError::ChallengeExpired
            | StepUpError::AttemptsExhausted => ErrorKind::Gone,
            StepUpError::AlreadyUsed | StepUpError::CodeMismatch { .. } => ErrorKind::Conflict,
            StepUpError::Database(_) | StepUpError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Wording shown to the end user
    ///
    /// Expected outcomes all share one neutral phrasing; the internal
    /// variant stays distinct for logging and tests.
    pub fn user_message(&self) -> &'static str {
        match self {
            StepUpError::Database(_) | StepUpError::Internal(_) => {
                "Something went wrong. Please try again later."
            }
            _ => NEUTRAL_CODE_MESSAGE,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            StepUpError::Database(e) => {
                tracing::error!(error = %e, "Step-up database error");
            }
            StepUpError::Internal(msg) => {
                tracing::error!(message = %msg, "Step-up internal error");
            }
            StepUpError::RateLimited { retry_after } => {
                tracing::warn!(retry_after_secs = retry_after.as_secs(), "Issuance rate limited");
            }
            StepUpError::AttemptsExhausted => {
                tracing::warn!("Verification attempts exhausted");
            }
            _ => {
                tracing::debug!(error = %self, "Step-up error");
            }
        }
    }
}

impl From<StepUpError> for AppError {
    fn from(err: StepUpError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        AppError::new(kind, message)
    }
}

impl IntoResponse for StepUpError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "success": false,
            "message": self.user_message(),
        }));

        match self {
            StepUpError::RateLimited { retry_after } => {
                let secs = retry_after.as_secs().max(1).to_string();
                (status, [(header::RETRY_AFTER, secs)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
