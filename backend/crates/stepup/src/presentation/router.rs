//! Step-Up Router

use crate::application::config::StepUpConfig;
use crate::domain::repository::{
    ChallengeRepository, CodeDelivery, RateLimitRepository, SessionRegistry,
};
use crate::infra::postgres::PgStepUpRepository;
use crate::presentation::handlers::{self, StepUpAppState};
use crate::presentation::middleware;
use axum::{Router, routing::post};
use std::sync::Arc;

/// Create the step-up router with the PostgreSQL repository
pub fn step_up_router<D>(repo: PgStepUpRepository, delivery: D, config: StepUpConfig) -> Router
where
    D: CodeDelivery + Clone + Send + Sync + 'static,
{
    step_up_router_generic(repo, delivery, config)
}

/// Create a step-up router for any repository implementation
pub fn step_up_router_generic<R, D>(repo: R, delivery: D, config: StepUpConfig) -> Router
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
    let state = StepUpAppState {
        repo: Arc::new(repo),
        delivery: Arc::new(delivery),
        config: Arc::new(config),
    };

    let auth_state = state.clone();

    Router::new()
        .route("/challenge", post(handlers::request_challenge::<R, D>))
        .route("/verify", post(handlers::submit_code::<R, D>))
        .route("/sessions/revoke", post(handlers::revoke_sessions::<R, D>))
        .layer(axum::middleware::from_fn(move |req, next| {
            let state = auth_state.clone();
            async move { middleware::require_authenticated(state, req, next).await }
        }))
        .with_state(state)
}
