//! Authentication controller.

use crate::{
    extractors::{CurrentUser, RequestPayload},
    responses::{done, ok, ok_with, ApiResult},
    state::AppState,
};
use axum::extract::State;
use orgdesk_service::{LoginResponse, UserView};
use tracing::debug;

/// Checks credentials and issues a bearer token.
pub async fn login(
    State(state): State<AppState>,
    RequestPayload(payload): RequestPayload,
) -> ApiResult<LoginResponse> {
    debug!("Login request");
    let response = state.auth_service.login(payload).await?;
    ok_with("Login successful", response)
}

/// Returns the current user with division, position and roles.
pub async fn me(State(state): State<AppState>, CurrentUser(current): CurrentUser) -> ApiResult<UserView> {
    debug!("Me request: {}", current.user.id);
    let view = state.auth_service.me(current.user).await?;
    ok(view)
}

/// Revokes the token the request was made with.
pub async fn logout(State(state): State<AppState>, CurrentUser(current): CurrentUser) -> ApiResult<()> {
    debug!("Logout request: {}", current.user.id);
    state.auth_service.logout(current.token_id).await?;
    done("Successfully logged out")
}
