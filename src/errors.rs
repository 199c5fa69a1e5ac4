use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::store::StoreError;

/// A single rejected form field, reported inline next to the input.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("validation failed")]
    ValidationFailed(Vec<FieldError>),

    #[error("car is not available on the selected dates")]
    NotAvailable,

    #[error("store schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SchemaMismatch(msg) => AppError::SchemaMismatch(msg),
            StoreError::Overlap => AppError::NotAvailable,
            other => AppError::StoreUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Store details go to the log, never to the customer.
        let (status, body) = match &self {
            AppError::ValidationFailed(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({
                    "error": "Please correct the highlighted fields.",
                    "fields": fields,
                }),
            ),
            AppError::NotAvailable => (
                StatusCode::CONFLICT,
                serde_json::json!({ "error": "Car is not available on selected dates." }),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": format!("{what} not found.") }),
            ),
            AppError::StoreUnavailable(detail) => {
                tracing::error!(error = %detail, "store call failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    serde_json::json!({ "error": "Cannot connect to server. Please try again." }),
                )
            }
            AppError::SchemaMismatch(detail) => {
                tracing::error!(error = %detail, "store rejected request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Booking failed. Please try again." }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
