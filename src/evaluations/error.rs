use axum::{response::IntoResponse, Json};

use crate::core::middleware::AccessDenied;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EvaluationsError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for EvaluationsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::NotFound(e.to_string()),
            StoreError::Conflict(msg) => Self::Validation(msg),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<AccessDenied> for EvaluationsError {
    fn from(e: AccessDenied) -> Self {
        Self::Forbidden(e.to_string())
    }
}

impl IntoResponse for EvaluationsError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Database(msg) | Self::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
