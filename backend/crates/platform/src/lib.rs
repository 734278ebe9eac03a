//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (CSPRNG helpers, constant-time comparison)
//! - Cookie extraction
//! - Rate limiting infrastructure

pub mod cookie;
pub mod crypto;
pub mod rate_limit;
