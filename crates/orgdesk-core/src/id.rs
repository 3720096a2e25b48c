//! Typed ID wrappers for domain entities.
//!
//! Every table uses an auto-increment integer key. Wrapping it per entity
//! keeps a `DivisionId` from being passed where a `PositionId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wraps a raw key.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw key.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(
    /// Primary key of `login_users`.
    UserId
);
typed_id!(
    /// Primary key of `login_roles`.
    RoleId
);
typed_id!(
    /// Primary key of `login_divisions`.
    DivisionId
);
typed_id!(
    /// Primary key of `login_positions`.
    PositionId
);
typed_id!(
    /// Primary key of `login_access_tokens`.
    AccessTokenId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!("42".parse::<UserId>().unwrap(), UserId(42));
        assert_eq!(" 7 ".parse::<RoleId>().unwrap(), RoleId(7));
        assert!("abc".parse::<DivisionId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_number() {
        let json = serde_json::to_string(&PositionId::new(3)).unwrap();
        assert_eq!(json, "3");
        let id: UserId = serde_json::from_str("11").unwrap();
        assert_eq!(id.into_inner(), 11);
    }
}
