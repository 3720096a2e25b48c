//! # Orgdesk Security
//!
//! Argon2 password hashing and opaque bearer tokens.
//!
//! A token handed to a client has the form `<id>|<secret>`. Only the SHA-256
//! digest of the secret is stored, so a leaked token table cannot be replayed.

mod password;
mod token;

pub use password::*;
pub use token::*;
