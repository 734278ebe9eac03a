//! Step-Up Verification Backend Module
//!
//! Challenge/response step-up authentication for the admin surface:
//! one-time code issuance, rate limiting, bounded-attempt validation and
//! bulk session invalidation.
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases
//! - `infra/` - Storage backends (PostgreSQL, in-memory)
//! - `presentation/` - HTTP handlers
//!
//! ## Security Model
//! - Codes come from a CSPRNG with a bias-free digit mapping and are
//!   compared in constant time
//! - One live challenge per (subject, purpose); issuance supersedes
//! - Consumption is atomic: one completion per challenge, ever
//! - Wrong-code, rate-limited and exhausted outcomes share one user-facing
//!   wording; internal kinds stay distinct
//! - Only authenticated subjects reach the core; the middleware rejects
//!   everything else up front

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::StepUpConfig;
pub use error::{StepUpError, StepUpResult};
pub use infra::memory::InMemoryStepUpRepository;
pub use infra::postgres::PgStepUpRepository;
pub use presentation::router::{step_up_router, step_up_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
