//! # Orgdesk Config
//!
//! Layered configuration: TOML files under `config/`, then environment
//! variables with the `ORGDESK_` prefix. Values are validated once at load
//! time so the server fails fast on a bad setup.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
