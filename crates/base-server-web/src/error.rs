//! Error types for the API and dashboard servers.
//!
//! [`WebError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body uses the `{"success": false, "error": ...}` envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use base_server_bist::BistError;
use base_server_core::FunctionError;

/// Errors that can occur in the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// An invalid query parameter or body was provided.
    #[error("{0}")]
    BadRequest(String),

    /// A handler function failed unexpectedly.
    #[error("{0}")]
    Function(#[from] FunctionError),

    /// A dashboard template failed to render.
    #[error("template error: {0}")]
    Template(String),

    /// The self test could not run or its report could not be read.
    #[error("{0}")]
    Bist(#[from] BistError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WebError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Function(_) | Self::Template(_) | Self::Bist(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<minijinja::Error> for WebError {
    fn from(e: minijinja::Error) -> Self {
        Self::Template(e.to_string())
    }
}

impl From<tokio::task::JoinError> for WebError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {e}"))
    }
}
