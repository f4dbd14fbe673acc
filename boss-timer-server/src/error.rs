//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! Database errors are logged with full detail but only a generic message is
//! returned to the caller so that SQL or file paths never leak to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the boss-timer-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the record store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The caller referenced a record that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was well-formed but refers to something the server does
    /// not accept, e.g. a boss missing from the catalog.
    #[error("validation error: {0}")]
    Validation(String),

    /// The request body exceeded the configured limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let client_message = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::NotFound(m)
            | ServerError::Validation(m)
            | ServerError::PayloadTooLarge(m) => m.clone(),

            ServerError::Database(e) => {
                error!(error = %e, "database error");
                "internal server error".to_owned()
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
