//! Dashboard controller.

use crate::{
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{extract::State, routing::get, Router};
use orgdesk_service::DashboardStatistics;

/// Creates the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/statistics", get(statistics))
}

async fn statistics(State(state): State<AppState>) -> ApiResult<DashboardStatistics> {
    ok(state.dashboard_service.statistics().await?)
}
