//! The identity a mutation is attributed to.

use crate::UserId;
use std::fmt::{self, Display};

/// Who performed a create/update, recorded in the `*_created_by` and
/// `*_updated_by` audit columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// An authenticated user.
    User(UserId),
    /// No authenticated user (bootstrap, seeding, internal jobs).
    System,
}

impl Actor {
    /// Sentinel stored when no user is attributed.
    pub const SYSTEM: &'static str = "system";

    /// Builds an actor from an optional authenticated user.
    #[must_use]
    pub fn from_user(user: Option<UserId>) -> Self {
        user.map_or(Self::System, Self::User)
    }

    /// Returns the value written to audit columns.
    #[must_use]
    pub fn audit_value(&self) -> String {
        self.to_string()
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{id}"),
            Self::System => f.write_str(Self::SYSTEM),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_value() {
        assert_eq!(Actor::User(UserId(5)).audit_value(), "5");
        assert_eq!(Actor::System.audit_value(), "system");
        assert_eq!(Actor::from_user(None), Actor::System);
        assert_eq!(Actor::from_user(Some(UserId(9))), Actor::User(UserId(9)));
    }
}
