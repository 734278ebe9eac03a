//! Infrastructure Layer - Storage backends and collaborator stand-ins

pub mod delivery;
pub mod memory;
pub mod postgres;
