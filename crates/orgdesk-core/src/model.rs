//! Domain entities.
//!
//! Serialized field names match the storage column names because they are
//! also the wire names clients send and receive.

use crate::{AccessTokenId, DivisionId, PositionId, RoleId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

/// A user account.
#[derive(Clone, PartialEq, Serialize)]
pub struct User {
    #[serde(rename = "u_id")]
    pub id: UserId,
    #[serde(rename = "u_employee_id")]
    pub employee_id: String,
    #[serde(rename = "u_name")]
    pub name: String,
    /// Always stored lowercase.
    #[serde(rename = "u_email")]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "u_phone")]
    pub phone: Option<String>,
    #[serde(rename = "u_address")]
    pub address: Option<String>,
    #[serde(rename = "u_birthdate")]
    pub birthdate: Option<NaiveDate>,
    #[serde(rename = "u_join_date")]
    pub join_date: NaiveDate,
    /// Path relative to the public storage root.
    #[serde(rename = "u_profile_image")]
    pub profile_image: Option<String>,
    #[serde(rename = "u_division_id")]
    pub division_id: Option<DivisionId>,
    #[serde(rename = "u_position_id")]
    pub position_id: Option<PositionId>,
    #[serde(rename = "u_is_manager")]
    pub is_manager: bool,
    #[serde(rename = "u_manager_id")]
    pub manager_id: Option<UserId>,
    #[serde(rename = "u_is_active")]
    pub is_active: bool,
    #[serde(rename = "u_created_by")]
    pub created_by: Option<String>,
    #[serde(rename = "u_updated_by")]
    pub updated_by: Option<String>,
    #[serde(rename = "u_created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "u_updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("employee_id", &self.employee_id)
            .field("email", &self.email)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

/// Attributes of a user about to be inserted.
#[derive(Clone, PartialEq)]
pub struct NewUser {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub join_date: NaiveDate,
    pub profile_image: Option<String>,
    pub division_id: Option<DivisionId>,
    pub position_id: Option<PositionId>,
    pub is_manager: bool,
    pub manager_id: Option<UserId>,
    pub is_active: bool,
    pub created_by: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("employee_id", &self.employee_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A role that can be granted to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Role {
    #[serde(rename = "role_id")]
    pub id: RoleId,
    #[serde(rename = "role_name")]
    pub name: String,
    /// Between 0 and 100000.
    #[serde(rename = "role_level")]
    pub level: i32,
    #[serde(rename = "role_is_active")]
    pub is_active: bool,
    #[serde(rename = "role_created_by")]
    pub created_by: Option<String>,
    #[serde(rename = "role_updated_by")]
    pub updated_by: Option<String>,
    #[serde(rename = "role_created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "role_updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A role with the number of users holding it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleSummary {
    #[serde(flatten)]
    pub role: Role,
    pub users_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRole {
    pub name: String,
    pub level: i32,
    pub is_active: bool,
    pub created_by: String,
}

/// An organizational division.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Division {
    #[serde(rename = "div_id")]
    pub id: DivisionId,
    #[serde(rename = "div_code")]
    pub code: String,
    #[serde(rename = "div_name")]
    pub name: String,
    #[serde(rename = "div_is_active")]
    pub is_active: bool,
    #[serde(rename = "div_created_by")]
    pub created_by: Option<String>,
    #[serde(rename = "div_updated_by")]
    pub updated_by: Option<String>,
    #[serde(rename = "div_created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "div_updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A job position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    #[serde(rename = "pos_id")]
    pub id: PositionId,
    #[serde(rename = "pos_code")]
    pub code: String,
    #[serde(rename = "pos_name")]
    pub name: String,
    #[serde(rename = "pos_is_active")]
    pub is_active: bool,
    #[serde(rename = "pos_created_by")]
    pub created_by: Option<String>,
    #[serde(rename = "pos_updated_by")]
    pub updated_by: Option<String>,
    #[serde(rename = "pos_created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "pos_updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Attributes of a division or position about to be inserted.
///
/// Both tables share the code/name/active shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogEntry {
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_by: String,
}

/// A stored bearer token. Only the digest of the secret is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub id: AccessTokenId,
    pub user_id: UserId,
    pub name: String,
    pub token_hash: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Returns true if the token carries an expiry that has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccessToken {
    pub user_id: UserId,
    pub name: String,
    pub token_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A named tally used by dashboard breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub name: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId(1),
            employee_id: "EMP001".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            phone: None,
            address: None,
            birthdate: None,
            join_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            profile_image: None,
            division_id: Some(DivisionId(2)),
            position_id: None,
            is_manager: false,
            manager_id: None,
            is_active: true,
            created_by: Some("system".to_string()),
            updated_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_user_never_serializes_password() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("u_password").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["u_email"], "ada@example.com");
        assert_eq!(json["u_join_date"], "2024-01-15");
        assert_eq!(json["u_division_id"], 2);
    }

    #[test]
    fn test_user_debug_hides_password() {
        assert!(!format!("{:?}", user()).contains("argon2"));
    }

    #[test]
    fn test_token_expiry() {
        let now = Utc::now();
        let mut token = AccessToken {
            id: AccessTokenId(1),
            user_id: UserId(1),
            name: "auth_token".to_string(),
            token_hash: String::new(),
            last_used_at: None,
            expires_at: None,
            created_at: None,
        };
        assert!(!token.is_expired(now));
        token.expires_at = Some(now - chrono::Duration::minutes(1));
        assert!(token.is_expired(now));
    }
}
