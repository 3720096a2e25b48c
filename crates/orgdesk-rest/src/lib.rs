//! # Orgdesk REST
//!
//! REST API layer using Axum for Orgdesk.
//! Provides the HTTP endpoints for authentication, the dashboard, health
//! probes, and CRUD over users, roles, divisions and positions.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
