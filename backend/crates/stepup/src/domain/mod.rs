//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Challenge)
//! - Domain value objects (Purpose, ChallengeCode, RateLimitAction)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod value_objects;
