//! Domain Value Objects
//!
//! Immutable value types for the step-up verification domain.

use platform::crypto::{constant_time_eq, random_numeric_code};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Purpose tag scoping challenges
///
/// Keeps independent verification flows from colliding for the same
/// subject: uniqueness is per (subject, purpose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Step-up verification after password sign-in
    LoginVerify,
}

impl Purpose {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Purpose::LoginVerify => "login-verify",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login-verify" => Ok(Purpose::LoginVerify),
            _ => Err(UnknownPurpose(s.to_string())),
        }
    }
}

/// Returned when a stored purpose tag is not recognized
#[derive(Debug, thiserror::Error)]
#[error("unknown challenge purpose: {0}")]
pub struct UnknownPurpose(pub String);

/// One-time verification code
///
/// Fixed-length numeric secret from a CSPRNG. The digit mapping is
/// rejection-sampled, so no digit is more likely than another. Zeroed on
/// drop and redacted from Debug output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChallengeCode(String);

impl ChallengeCode {
    /// Generate a fresh random code of `len` digits
    pub fn generate(len: usize) -> Self {
        Self(random_numeric_code(len))
    }

    /// Rebuild a code from its stored representation
    pub(crate) fn from_stored(code: String) -> Self {
        Self(code)
    }

    /// Validate the shape of a submitted code before any comparison
    pub fn is_well_formed(submitted: &str, len: usize) -> bool {
        submitted.len() == len && submitted.bytes().all(|b| b.is_ascii_digit())
    }

    /// Constant-time comparison against a submitted code
    pub fn matches(&self, submitted: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), submitted.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChallengeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChallengeCode(****)")
    }
}

/// Rate-limited action names
///
/// Each action carries its own window configuration; the storage key is
/// (identity, action).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    /// One-time code issuance
    IssueCode,
}

impl RateLimitAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RateLimitAction::IssueCode => "otp",
        }
    }
}

impl fmt::Display for RateLimitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
