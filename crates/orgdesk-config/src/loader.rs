//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use orgdesk_core::{OrgdeskError, OrgdeskResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads [`AppConfig`] from layered sources.
///
/// Sources are applied in order, later ones overriding earlier ones:
/// 1. `{dir}/default.toml`
/// 2. `{dir}/{environment}.toml`
/// 3. `{dir}/local.toml` (not committed to version control)
/// 4. Environment variables such as `ORGDESK_DATABASE__URL`
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    environment: Option<String>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Environment variable prefix.
    pub const ENV_PREFIX: &'static str = "ORGDESK";

    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            environment: None,
            env_prefix: Self::ENV_PREFIX.to_string(),
        }
    }

    /// Loader for `./config`.
    #[must_use]
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Selects the environment file instead of reading `ORGDESK_ENV`.
    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Builds and validates the configuration.
    pub fn load(&self) -> OrgdeskResult<AppConfig> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment = self.environment.clone().unwrap_or_else(|| {
            std::env::var(format!("{}_ENV", self.env_prefix)).unwrap_or_else(|_| "development".to_string())
        });
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();
        for name in ["default", environment.as_str(), "local"] {
            let path = self.config_dir.join(format!("{name}.toml"));
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path.display());
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let app_config = builder
            .build()
            .and_then(|c| c.try_deserialize::<AppConfig>())
            .map_err(config_error)?;

        ConfigValidator::validate(&app_config)
            .map_err(|errors| OrgdeskError::Configuration(format_validation_errors(&errors)))?;

        Ok(app_config)
    }
}

fn config_error(err: ConfigError) -> OrgdeskError {
    OrgdeskError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pagination.default_per_page, 10);
        assert_eq!(config.pagination.max_per_page, 100);
        assert!(config.security.token_expiration_minutes.is_none());
    }

    #[test]
    fn test_server_address() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_layered_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 9000\nhost = \"127.0.0.1\"\n[pagination]\ndefault_per_page = 15\n",
        )
        .unwrap();
        fs::write(dir.path().join("staging.toml"), "[server]\nport = 9100\n").unwrap();

        let config = ConfigLoader::new(dir.path())
            .environment("staging")
            .env_prefix("ORGDESK_LAYERED_TEST")
            .load()
            .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.pagination.default_per_page, 15);
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_environment_variables_override_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[server]\nport = 9000\n").unwrap();
        std::env::set_var("ORGDESK_ENV_TEST_SERVER__PORT", "9500");

        let config = ConfigLoader::new(dir.path())
            .environment("testing")
            .env_prefix("ORGDESK_ENV_TEST")
            .load()
            .unwrap();

        assert_eq!(config.server.port, 9500);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[database]\nurl = \"postgres://localhost/db\"\n",
        )
        .unwrap();

        let err = ConfigLoader::new(dir.path())
            .environment("testing")
            .env_prefix("ORGDESK_INVALID_TEST")
            .load()
            .unwrap_err();

        assert!(matches!(err, OrgdeskError::Configuration(ref m) if m.contains("database")));
    }
}
