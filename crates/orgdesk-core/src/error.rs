//! Unified error types for all layers of the application.

use std::collections::BTreeMap;
use std::fmt::Debug;
use thiserror::Error;

/// Field-level validation messages, keyed by payload field name.
///
/// Array items are keyed with their index (`roles.0`).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Unified error type for all layers of Orgdesk.
///
/// Domain variants carry a message that is safe to return to clients.
/// Infrastructure variants carry diagnostic detail that is only logged.
#[derive(Error, Debug)]
pub enum OrgdeskError {
    // ============ Domain Errors ============
    /// Resource not found
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Payload failed validation
    #[error("Validation error")]
    Validation(FieldErrors),

    /// Request body could not be read
    #[error("{0}")]
    BadRequest(String),

    /// Operation blocked by existing state (e.g. dependent records)
    #[error("{0}")]
    Conflict(String),

    // ============ Authentication Errors ============
    /// Missing or invalid bearer token
    #[error("{0}")]
    Unauthorized(String),

    /// Login rejected
    #[error("Invalid credentials")]
    InvalidCredentials,

    // ============ Infrastructure Errors ============
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// File storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrgdeskError {
    /// Message returned to clients for errors whose detail must stay internal.
    pub const INTERNAL_MESSAGE: &'static str = "Internal server error";

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 422,
            Self::BadRequest(_) | Self::Conflict(_) => 400,
            Self::Unauthorized(_) | Self::InvalidCredentials => 401,
            Self::Database(_)
            | Self::Storage(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true when the error's detail must not reach the client.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// Returns the message that may be shown to API clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            Self::INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    /// Returns the field errors of a validation failure.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub const fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    /// Creates a validation error carrying a single field message.
    #[must_use]
    pub fn field<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        Self::Validation(errors)
    }

    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::BadRequest(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates an unauthorized error for a missing or unknown bearer token.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::Unauthorized("Unauthenticated.".to_string())
    }

    /// Creates a storage error.
    #[must_use]
    pub fn storage<T: Into<String>>(message: T) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for OrgdeskError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound { resource: "Record" },
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    return Self::Conflict("The record already exists.".to_string());
                }
                if db_err.is_foreign_key_violation() {
                    return Self::Conflict(
                        "The record is referenced by or references a missing record.".to_string(),
                    );
                }
                Self::Database(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<std::io::Error> for OrgdeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for OrgdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(OrgdeskError::not_found("User").status_code(), 404);
        assert_eq!(OrgdeskError::field("u_email", "bad").status_code(), 422);
        assert_eq!(OrgdeskError::conflict("has users").status_code(), 400);
        assert_eq!(OrgdeskError::bad_request("Invalid JSON payload").status_code(), 400);
        assert_eq!(OrgdeskError::unauthenticated().status_code(), 401);
        assert_eq!(OrgdeskError::InvalidCredentials.status_code(), 401);
        assert_eq!(OrgdeskError::Database("down".to_string()).status_code(), 500);
        assert_eq!(OrgdeskError::storage("disk full").status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(OrgdeskError::not_found("Role").error_code(), "NOT_FOUND");
        assert_eq!(OrgdeskError::field("x", "y").error_code(), "VALIDATION_ERROR");
        assert_eq!(OrgdeskError::internal("oops").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(OrgdeskError::not_found("Division").to_string(), "Division not found");
    }

    #[test]
    fn test_public_message_hides_internal_detail() {
        let err = OrgdeskError::Database("Access denied for user 'root'@'10.0.0.3'".to_string());
        assert_eq!(err.public_message(), "Internal server error");

        let err = OrgdeskError::conflict("Cannot delete role. It has associated users.");
        assert_eq!(err.public_message(), "Cannot delete role. It has associated users.");
    }

    #[test]
    fn test_field_error() {
        let err = OrgdeskError::field("div_code", "The div code has already been taken.");
        let errors = err.field_errors().unwrap();
        assert_eq!(errors["div_code"], vec!["The div code has already been taken."]);
        assert_eq!(err.to_string(), "Validation error");
    }

    #[test]
    fn test_io_error_is_storage() {
        let err: OrgdeskError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }
}
