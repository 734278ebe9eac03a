//! HTTP Handlers

use crate::application::complete_challenge::CompleteChallengeUseCase;
use crate::application::config::StepUpConfig;
use crate::application::issue_challenge::IssueChallengeUseCase;
use crate::application::revoke_sessions::RevokeSessionsUseCase;
use crate::domain::repository::{
    ChallengeRepository, CodeDelivery, RateLimitRepository, SessionRegistry,
};
use crate::domain::value_objects::Purpose;
use crate::error::StepUpResult;
use crate::presentation::dto::{
    RequestChallengeResponse, RevokeSessionsResponse, SubmitCodeRequest, SubmitCodeResponse,
};
use crate::presentation::middleware::AuthenticatedSubject;
use axum::extract::State;
use axum::{Extension, Json};
use std::sync::Arc;

/// Shared state for step-up handlers
#[derive(Clone)]
pub struct StepUpAppState<R, D>
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
    pub repo: Arc<R>,
    pub delivery: Arc<D>,
    pub config: Arc<StepUpConfig>,
}

/// POST /api/step-up/challenge
pub async fn request_challenge<R, D>(
    State(state): State<StepUpAppState<R, D>>,
    Extension(AuthenticatedSubject(subject_id)): Extension<AuthenticatedSubject>,
) -> StepUpResult<Json<RequestChallengeResponse>>
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
    let use_case = IssueChallengeUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.delivery.clone(),
        state.config.clone(),
    );

    let output = use_case.execute(subject_id, Purpose::LoginVerify).await?;

    let message = if output.delivered {
        "Code sent successfully"
    } else {
        "Code issued but delivery is delayed; you can request another"
    };

    Ok(Json(RequestChallengeResponse {
        success: true,
        message: message.to_string(),
        expires_at_ms: output.expires_at_ms,
    }))
}

/// POST /api/step-up/verify
pub async fn submit_code<R, D>(
    State(state): State<StepUpAppState<R, D>>,
    Extension(AuthenticatedSubject(subject_id)): Extension<AuthenticatedSubject>,
    Json(req): Json<SubmitCodeRequest>,
) -> StepUpResult<Json<SubmitCodeResponse>>
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
    let use_case = CompleteChallengeUseCase::new(state.repo.clone(), state.config.clone());

    use_case
        .execute(subject_id, Purpose::LoginVerify, &req.code)
        .await?;

    Ok(Json(SubmitCodeResponse {
        success: true,
        message: "Code verified successfully".to_string(),
    }))
}

/// POST /api/step-up/sessions/revoke
pub async fn revoke_sessions<R, D>(
    State(state): State<StepUpAppState<R, D>>,
    Extension(AuthenticatedSubject(subject_id)): Extension<AuthenticatedSubject>,
) -> StepUpResult<Json<RevokeSessionsResponse>>
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
    let use_case = RevokeSessionsUseCase::new(state.repo.clone());

    let revoked = use_case.execute(subject_id).await?;

    Ok(Json(RevokeSessionsResponse {
        success: true,
        message: "Signed out on all devices".to_string(),
        revoked,
    }))
}
