//! # Orgdesk Repository
//!
//! Data access for users, roles, divisions, positions and access tokens.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn UserRepository>   (domain interface, traits.rs)
//! MySqlUserRepository            (sqlx implementation, mysql/)
//!   ↓  Arc<dyn DatabasePoolInterface>
//! MySQL
//! ```
//!
//! With the `memory` feature, [`memory::InMemoryDatabase`] implements every
//! repository trait over plain collections for tests of the upper layers.

pub mod mysql;
pub mod pool;
pub mod traits;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use mysql::*;
pub use pool::*;
pub use traits::*;
