//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::infrastructure::user::{AuthError, FieldError};

pub const MSG_TOKEN_MISSING: &str = "Token missing, access denied";
pub const MSG_TOKEN_INVALID: &str = "Invalid token, access denied";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const MSG_DUPLICATE_USERNAME: &str = "Username already exists";
pub const MSG_USER_NOT_FOUND: &str = "User not found";
pub const MSG_RATE_LIMITED: &str = "Too many requests from this IP, please try again later";
const MSG_INTERNAL: &str = "Internal server error";

/// One entry of a field validation failure list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<FieldError> for ValidationIssue {
    fn from(err: FieldError) -> Self {
        Self {
            msg: err.message,
            path: Some(err.field),
            location: Some("body".to_string()),
        }
    }
}

/// Error body: either a single message or a list of field problems
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorResponse {
    Errors { errors: Vec<ValidationIssue> },
    Message { message: String },
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse::Message {
                message: message.into(),
            },
        }
    }

    /// 400 with a list of field problems
    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ApiErrorResponse::Errors { errors: issues },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn rate_limited() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, MSG_RATE_LIMITED)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// Map an auth failure, using `internal_message` as the client-facing
    /// text for storage and internal errors
    pub fn from_auth(err: AuthError, internal_message: &str) -> Self {
        match err {
            AuthError::Validation(fields) => {
                Self::validation(fields.into_iter().map(ValidationIssue::from).collect())
            }
            AuthError::DuplicateUsername => Self::conflict(MSG_DUPLICATE_USERNAME),
            AuthError::InvalidCredentials => Self::unauthorized(MSG_INVALID_CREDENTIALS),
            AuthError::TokenMissing => Self::unauthorized(MSG_TOKEN_MISSING),
            AuthError::Token(_) => Self::forbidden(MSG_TOKEN_INVALID),
            AuthError::UserNotFound => Self::not_found(MSG_USER_NOT_FOUND),
            AuthError::Storage(detail) | AuthError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                Self::internal(internal_message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::from_auth(err, MSG_INTERNAL)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.response {
            ApiErrorResponse::Message { message } => write!(f, "{}: {}", self.status, message),
            ApiErrorResponse::Errors { errors } => {
                write!(f, "{}: {} validation error(s)", self.status, errors.len())
            }
        }
    }
}

impl std::error::Error for ApiError {}
