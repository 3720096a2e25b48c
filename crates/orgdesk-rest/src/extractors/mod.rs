//! Custom Axum extractors.

mod current_user;
mod payload;

pub use current_user::*;
pub use payload::*;
