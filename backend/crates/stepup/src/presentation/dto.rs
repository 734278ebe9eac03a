//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

/// Response for POST /api/step-up/challenge
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestChallengeResponse {
    pub success: bool,
    pub message: String,
    pub expires_at_ms: i64,
}

/// Request for POST /api/step-up/verify
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCodeRequest {
    pub code: String,
}

/// Response for POST /api/step-up/verify
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCodeResponse {
    pub success: bool,
    pub message: String,
}

/// Response for POST /api/step-up/sessions/revoke
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeSessionsResponse {
    pub success: bool,
    pub message: String,
    pub revoked: u64,
}
