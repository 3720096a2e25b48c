//! # Orgdesk Server Library
//!
//! Dependency injection wiring, logging setup and the startup sequence
//! shared by the `orgdesk-server` binary.

pub mod app;
pub mod di;
pub mod startup;
pub mod telemetry;
