//! The JSON envelope every endpoint answers with.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orgdesk_core::{FieldErrors, OrgdeskError};
use serde::Serialize;
use tracing::{debug, error};

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: None,
        }
    }

    /// Creates a successful response with a message.
    pub fn success_with(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }
}

impl ApiResponse<()> {
    /// Creates a successful response carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            errors: None,
        }
    }

    /// Creates an error response.
    pub fn error(err: &OrgdeskError) -> Self {
        Self {
            success: false,
            message: Some(err.public_message()),
            data: None,
            errors: err.field_errors().cloned(),
        }
    }
}

/// Application error type for Axum.
#[derive(Debug)]
pub struct AppError(pub OrgdeskError);

impl From<OrgdeskError> for AppError {
    fn from(err: OrgdeskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_internal() {
            error!(code = self.0.error_code(), "Request failed: {}", self.0);
        } else {
            debug!(code = self.0.error_code(), "Request rejected: {}", self.0);
        }

        (status, Json(ApiResponse::error(&self.0))).into_response()
    }
}

/// Result type for Axum handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Helper to create a success response.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Helper to create a success response with a message.
pub fn ok_with<T: Serialize>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success_with(message, data)))
}

/// Helper to create a created (201) response.
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success_with(message, data)))
}

/// Helper to create a message-only success response.
pub fn done(message: impl Into<String>) -> ApiResult<()> {
    Ok(Json(ApiResponse::message(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::success(json!({ "id": 1 }))).unwrap();
        assert_eq!(body, json!({ "success": true, "data": { "id": 1 } }));

        let body = serde_json::to_value(ApiResponse::message("Role deleted successfully")).unwrap();
        assert_eq!(body, json!({ "success": true, "message": "Role deleted successfully" }));
    }

    #[test]
    fn test_validation_envelope() {
        let err = OrgdeskError::field("div_code", "The div code field is required.");
        let body = serde_json::to_value(ApiResponse::error(&err)).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Validation error",
                "errors": { "div_code": ["The div code field is required."] }
            })
        );
    }

    #[test]
    fn test_internal_error_is_generic() {
        let err = OrgdeskError::Database("Connection refused (os error 111)".to_string());
        let response = AppError(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::to_value(ApiResponse::error(&OrgdeskError::storage("disk full"))).unwrap();
        assert_eq!(body["message"], "Internal server error");
    }
}
