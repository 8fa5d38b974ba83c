//! Server error type and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use simdash::DashError;

/// All errors surfaced by request handlers.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) | ServerError::Io(_) | ServerError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DashError> for ServerError {
    fn from(e: DashError) -> Self {
        match e {
            // Export model content comes from the request body, the rest
            // from server-side resources.
            DashError::InvalidExport(_) => ServerError::InvalidInput(e.to_string()),
            DashError::Schema(_)
            | DashError::UnknownPrototype(_)
            | DashError::MissingConverter { .. }
            | DashError::Json(_) => ServerError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match status {
            // Never leak internal details to the client.
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("request failed: {self}");
                "Internal server error".to_string()
            }
            _ => {
                tracing::warn!("request rejected: {self}");
                self.to_string()
            }
        };
        (status, body).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
