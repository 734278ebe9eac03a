//! Subject Resolution Middleware
//!
//! Resolves the authenticated subject from the HMAC-signed admin session
//! cookie before any step-up operation runs. Unauthenticated requests are
//! rejected here; the core never sees them.
//!
//! Session issuance and liveness belong to the surrounding application's
//! sign-in flow; this middleware only verifies the token signature and
//! extracts the subject it names.

use crate::domain::repository::{
    ChallengeRepository, CodeDelivery, RateLimitRepository, SessionRegistry,
};
use crate::presentation::handlers::StepUpAppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use hmac::{Hmac, Mac};
use kernel::id::SubjectId;
use sha2::Sha256;

/// The verified subject, stored in request extensions for handlers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedSubject(pub SubjectId);

/// Middleware that requires a signed admin session cookie
pub async fn require_authenticated<R, D>(
    state: StepUpAppState<R, D>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: ChallengeRepository
        + RateLimitRepository
        + SessionRegistry
        + Clone
        + Send
        + Sync
        + 'static,
    D: CodeDelivery + Clone + Send + Sync + 'static,
{
    let token = platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name);

    let subject_id = token.and_then(|t| verify_session_token(&t, &state.config.session_secret));

    let Some(subject_id) = subject_id else {
        tracing::debug!("Missing or invalid admin session token");
        return Err((StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response());
    };

    req.extensions_mut().insert(AuthenticatedSubject(subject_id));

    Ok(next.run(req).await)
}

/// Parse and verify a session token of the form `<subject-uuid>.<sig-b64url>`
fn verify_session_token(token: &str, secret: &[u8; 32]) -> Option<SubjectId> {
    let (subject_str, signature_b64) = token.split_once('.')?;

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(subject_str.as_bytes());

    let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .ok()?;

    mac.verify_slice(&signature).ok()?;

    subject_str.parse().ok()
}

/// Produce a token the middleware accepts
///
/// The surrounding application's sign-in flow owns token creation in
/// production; this exists for tests and local tooling.
pub fn sign_session_token(subject_id: &SubjectId, secret: &[u8; 32]) -> String {
    let subject_str = subject_id.to_string();

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(subject_str.as_bytes());

    let signature =
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{subject_str}.{signature}")
}
