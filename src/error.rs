//! Error types for the user service
//!
//! Provides unified error handling using thiserror. The error is `Clone` so a
//! single coalesced load can hand the same outcome to every waiter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// == Error Enum ==
/// Unified error type for the user service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// User does not exist in the entity store
    #[error("User not found: {0}")]
    NotFound(String),

    /// Connectivity or I/O failure reported by the entity store
    #[error("Store failure: {0}")]
    Store(String),

    /// Internal invariant violated (e.g. a loader panicked)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid startup configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for the not-found kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("no matching row".to_string()),
            other => Error::Store(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Error::Store(format!("migration failed: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidState(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the user service.
pub type Result<T> = std::result::Result<T, Error>;
