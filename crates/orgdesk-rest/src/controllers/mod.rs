//! REST API controllers.

pub mod auth_controller;
pub mod dashboard_controller;
pub mod health_controller;
pub mod resource_controller;

pub use health_controller::*;
