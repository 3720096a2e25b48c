//! # Orgdesk Core
//!
//! Core types, traits, and error definitions for Orgdesk.
//! This crate provides the foundational abstractions used across all layers:
//! entities, typed ids, the error taxonomy, pagination and sorting, request
//! payloads and the validation support shared by request forms.

pub mod actor;
pub mod error;
pub mod id;
pub mod model;
pub mod pagination;
pub mod payload;
pub mod result;
pub mod sort;
pub mod traits;
pub mod validation;

pub use actor::*;
pub use error::*;
pub use id::*;
pub use model::*;
pub use pagination::*;
pub use payload::*;
pub use result::*;
pub use sort::*;
pub use traits::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::{module, Component, HasComponent, Interface};
