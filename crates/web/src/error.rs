use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::error::{DomainError, StorageError};
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Domain(DomainError),
    Validation(ValidationErrors),
    BadRequest(String),
    /// No session, or the session points at a user that is gone.
    NotLoggedIn,
    Forbidden(String),
    NotFound,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Domain(e) => write!(f, "Domain error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::NotLoggedIn => write!(f, "Not logged in"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            Self::NotFound => write!(f, "Resource not found"),
        }
    }
}

fn internal_error() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
            "error": "An internal error occurred"
        }),
    )
}

fn storage_response(error: &StorageError) -> (StatusCode, serde_json::Value) {
    match error {
        StorageError::NotFound => (
            StatusCode::NOT_FOUND,
            json!({
                "error": "Resource not found"
            }),
        ),
        StorageError::ConstraintViolation(msg) => (
            StatusCode::CONFLICT,
            json!({
                "error": msg
            }),
        ),
        e => {
            tracing::error!("Storage error: {:?}", e);
            internal_error()
        }
    }
}

fn domain_response(error: &DomainError) -> (StatusCode, serde_json::Value) {
    match error {
        DomainError::Unauthorized => (
            StatusCode::FORBIDDEN,
            json!({
                "error": error.to_string()
            }),
        ),
        DomainError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            json!({
                "error": error.to_string()
            }),
        ),
        DomainError::InvalidUsername
        | DomainError::WrongPassword
        | DomainError::InvalidInput(_) => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": error.to_string()
            }),
        ),
        DomainError::Integrity(detail) => {
            tracing::error!("Integrity error: {}", detail);
            internal_error()
        }
        DomainError::Storage(e) => storage_response(e),
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status_code, body) = match &self {
            Self::Storage(e) => storage_response(e),
            Self::Domain(e) => domain_response(e),
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": "Validation failed",
                        "details": field_errors
                    }),
                )
            }
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": msg
                }),
            ),
            Self::NotLoggedIn => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Please log in to continue"
                }),
            ),
            Self::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": msg
                }),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "Resource not found"
                }),
            ),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<DomainError> for WebError {
    fn from(error: DomainError) -> Self {
        Self::Domain(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}
