//! Application assembly and lifecycle.

use crate::{di, startup};
use axum::Router;
use orgdesk_config::AppConfig;
use orgdesk_core::{OrgdeskError, OrgdeskResult};
use orgdesk_repository::{DatabasePool, DatabasePoolInterface};
use orgdesk_rest::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// A connected application, ready to serve.
pub struct App {
    config: AppConfig,
    module: Arc<di::OrgdeskModule>,
    router: Router,
}

impl App {
    /// Connects the database, applies migrations when configured, and wires
    /// every component into the router.
    pub async fn build(config: AppConfig) -> OrgdeskResult<Self> {
        let pool = DatabasePool::connect(&config.database).await?;
        if config.database.run_migrations {
            pool.run_migrations().await?;
        } else {
            info!("Skipping database migrations");
        }

        let module = di::build_module(&pool, &config);
        Ok(Self::assemble(config, module))
    }

    /// Wires an existing module into the router.
    #[must_use]
    pub fn assemble(config: AppConfig, module: Arc<di::OrgdeskModule>) -> Self {
        let state = AppState::from_module(
            module.as_ref(),
            di::resource_handlers(&module, config.pagination.policy()),
            di::database_health(&module),
            config.app.version.clone(),
        );
        let router = create_router(state, &config.server);
        Self { config, module, router }
    }

    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serves until a shutdown signal arrives, then closes the pool.
    pub async fn run(self) -> OrgdeskResult<()> {
        let addr = self.config.server.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| OrgdeskError::Internal(format!("Failed to bind {addr}: {e}")))?;

        startup::print_startup_info(&self.config);
        info!("Starting REST server on http://{}", addr);

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(startup::shutdown_signal())
            .await;

        di::database_pool(&self.module).close().await;
        served.map_err(|e| OrgdeskError::Internal(format!("REST server error: {e}")))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("addr", &self.config.server.addr())
            .finish_non_exhaustive()
    }
}
