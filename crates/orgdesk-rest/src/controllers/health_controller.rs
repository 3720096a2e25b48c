//! Health check controller.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use orgdesk_core::HealthStatus;
use serde::Serialize;
use tracing::warn;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `UP` while the process serves requests.
    pub status: &'static str,
    /// RFC 3339 time of the check.
    pub timestamp: String,
    pub services: ServiceStatuses,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatuses {
    pub database: &'static str,
    pub app: &'static str,
}

/// Creates the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
}

async fn database_status(state: &AppState) -> HealthStatus {
    let status = state.database_health.check().await;
    if let HealthStatus::Unhealthy(reason) = &status {
        warn!("Health check {} failed: {}", state.database_health.name(), reason);
    }
    status
}

/// Health check endpoint. Always 200; a database outage shows up in
/// `services.database`.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = database_status(&state).await;
    Json(HealthResponse {
        status: "UP",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        services: ServiceStatuses {
            database: database.label(),
            app: "OK",
        },
        version: state.version.clone(),
    })
}

/// Readiness check endpoint.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if database_status(&state).await.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
