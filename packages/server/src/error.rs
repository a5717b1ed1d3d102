use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::form::Rejection;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::integrations::identity::IdentityError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `ROLE_NOT_MAPPED`,
    /// `NOT_FOUND`, `CONFLICT`, `UPSTREAM_ERROR`, `INTERNAL_ERROR`, or a submission
    /// rejection code such as `DEADLINE_PASSED` or `FIELD_REQUIRED`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 1-256 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// A form submission was refused by the gate or the field validator.
    Rejected(Rejection),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    /// The identity provider reported a role with no internal counterpart.
    RoleNotMapped(String),
    NotFound(String),
    Conflict(String),
    Upstream(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::Rejected(rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    code: rejection.code(),
                    message: rejection.to_string(),
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::RoleNotMapped(role) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "ROLE_NOT_MAPPED",
                    message: format!("Role '{role}' has no access to this portal"),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::Upstream(detail) => {
                tracing::error!("Upstream error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "UPSTREAM_ERROR",
                        message: "The identity service is unavailable".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        AppError::Rejected(rejection)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => AppError::NotFound(format!("File '{path}' not found")),
            StorageError::InvalidPath(msg) => AppError::Validation(msg),
            StorageError::SizeLimitExceeded { actual, limit } => AppError::Validation(format!(
                "File is too large ({actual} bytes, limit {limit} bytes)"
            )),
            StorageError::Io(e) => AppError::Internal(format!("storage I/O: {e}")),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => AppError::InvalidCredentials,
            other => AppError::Upstream(other.to_string()),
        }
    }
}
