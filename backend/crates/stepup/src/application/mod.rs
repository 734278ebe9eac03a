//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod complete_challenge;
pub mod config;
pub mod issue_challenge;
pub mod revoke_sessions;
