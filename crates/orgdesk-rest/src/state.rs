//! Application state for Axum handlers.

use orgdesk_core::HealthCheck;
use orgdesk_service::{AuthService, DashboardService, ResourceHandlers};
use shaku::{HasComponent, Module};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub dashboard_service: Arc<dyn DashboardService>,
    pub resources: ResourceHandlers,
    /// Probe behind `/health` and `/ready`.
    pub database_health: Arc<dyn HealthCheck>,
    /// Reported by `/health`.
    pub version: String,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        dashboard_service: Arc<dyn DashboardService>,
        resources: ResourceHandlers,
        database_health: Arc<dyn HealthCheck>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            auth_service,
            dashboard_service,
            resources,
            database_health,
            version: version.into(),
        }
    }

    /// Resolves the services from a Shaku module.
    pub fn from_module<M>(
        module: &M,
        resources: ResourceHandlers,
        database_health: Arc<dyn HealthCheck>,
        version: impl Into<String>,
    ) -> Self
    where
        M: Module + HasComponent<dyn AuthService> + HasComponent<dyn DashboardService>,
    {
        Self::new(
            module.resolve(),
            module.resolve(),
            resources,
            database_health,
            version,
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
