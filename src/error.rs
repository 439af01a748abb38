use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "Validation failed", Some(msg.clone()))
            }
            AppError::InvalidCursor(msg) => {
                (StatusCode::BAD_REQUEST, "Invalid cursor", Some(msg.clone()))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            success: false,
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// User-facing message constants, kept in one place so handlers and
/// validators stay consistent.
pub mod msg {
    pub const EMAIL_EMPTY: &str = "Email cannot be empty";
    pub const INVALID_EMAIL_FORMAT: &str = "Invalid email format";
    pub const NAME_EMPTY: &str = "Name cannot be empty";
    pub const ORG_NOT_FOUND: &str = "Organization not found";
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const MEMBER_NOT_FOUND: &str = "Member not found";
    pub const DEPARTMENT_NOT_FOUND: &str = "Department not found";
    pub const NOT_A_MEMBER: &str = "Not a member of this organization";
    pub const CANNOT_CHANGE_OWN_ROLE: &str = "Cannot change your own role";
    pub const CANNOT_DEACTIVATE_SELF: &str = "Cannot deactivate yourself";
    pub const DATE_RANGE_INVERTED: &str = "createdTo must not be earlier than createdFrom";
    pub const LIMIT_OUT_OF_RANGE: &str = "limit must be between 1 and 100";
}
