//! # Orgdesk Server
//!
//! Entry point: loads configuration, sets up logging, then serves the REST
//! API until Ctrl+C or SIGTERM.

use orgdesk_config::{AppConfig, ConfigLoader, ObservabilityConfig};
use orgdesk_core::OrgdeskResult;
use orgdesk_server::{app::App, startup, telemetry};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location().load() {
        Ok(config) => config,
        Err(e) => {
            let _ = telemetry::init_logging(&ObservabilityConfig::default());
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = telemetry::init_logging(&config.observability) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    startup::print_banner();
    info!("Starting Orgdesk Server...");
    info!("Version: {}", config.app.version);
    info!("Environment: {}", config.app.environment);

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> OrgdeskResult<()> {
    App::build(config).await?.run().await
}
