//! Structured error types for API responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,

    // Auth errors
    UsernameTaken,
    InvalidCredentials,
    InvalidToken,
    AuthDisabled,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InvalidFieldValue | ErrorCode::UsernameTaken => StatusCode::BAD_REQUEST,
            ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidCredentials | ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ErrorCode::AuthDisabled => StatusCode::NOT_IMPLEMENTED,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error for API responses. Serializes as the response body
/// with `detail` carrying the human-readable message.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn task_not_found() -> Self {
        Self::new(ErrorCode::TaskNotFound, "Task not found")
    }

    pub fn username_taken(username: &str) -> Self {
        Self::new(
            ErrorCode::UsernameTaken,
            format!("Username already registered: {}", username),
        )
        .with_field("username")
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Incorrect username or password")
    }

    pub fn invalid_token() -> Self {
        Self::new(ErrorCode::InvalidToken, "Invalid or missing bearer token")
    }

    pub fn auth_disabled() -> Self {
        Self::new(
            ErrorCode::AuthDisabled,
            "Authentication is disabled on this server",
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.detail)
    }
}

impl std::error::Error for ApiError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to ApiError first
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => ApiError::database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
