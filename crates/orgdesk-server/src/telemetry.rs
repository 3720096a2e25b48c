//! Logging setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to the
//! whole process and `tower_http` request spans are shown at debug.

use orgdesk_config::ObservabilityConfig;
use orgdesk_core::{OrgdeskError, OrgdeskResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives used when `RUST_LOG` is not set.
#[must_use]
pub fn default_directives(config: &ObservabilityConfig) -> String {
    format!("{},tower_http=debug", config.log_level.trim().to_lowercase())
}

fn is_json(config: &ObservabilityConfig) -> bool {
    config.log_format.trim().eq_ignore_ascii_case("json")
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> OrgdeskResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(config)));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if is_json(config) {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| OrgdeskError::Internal(format!("Failed to initialize logging: {e}")))?;
    tracing::debug!(level = %config.log_level, format = %config.log_format, "Logging initialized");
    Ok(())
}
