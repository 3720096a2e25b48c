//! # Orgdesk Service
//!
//! Business logic for the organization directory.
//!
//! Every entity goes through the same CRUD workflow in
//! [`ResourceHandler`]; what differs per entity (its form, side effects,
//! relations, delete guards) lives in its [`Resource`] implementation.

pub mod auth_service;
pub mod dashboard_service;
pub mod dto;
pub mod forms;
pub mod image_store;
pub mod lookup;
pub mod repositories;
pub mod resource;
pub mod resources;

#[cfg(test)]
mod test_support;

pub use auth_service::*;
pub use dashboard_service::*;
pub use dto::*;
pub use forms::*;
pub use image_store::*;
pub use lookup::*;
pub use repositories::*;
pub use resource::*;
pub use resources::*;
