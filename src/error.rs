//! Error taxonomy for scan requests and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{0}")]
    Validation(String),

    #[error("scan capacity exhausted, retry later")]
    Busy,

    #[error("scan timeout ({limit_secs}s)")]
    TimedOut { limit_secs: u64 },

    #[error("failed to launch scanning engine: {0}")]
    LaunchFailed(#[source] std::io::Error),

    #[error("scanning engine exited with {status}: {stderr}")]
    Engine { status: String, stderr: String },

    #[error("template catalog unavailable at {path}: {source}")]
    Catalog {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("result artifact error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl ScanError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScanError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ScanError::Validation(_) => StatusCode::BAD_REQUEST,
            ScanError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ScanError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
            ScanError::LaunchFailed(_)
            | ScanError::Engine { .. }
            | ScanError::Catalog { .. }
            | ScanError::Io(_)
            | ScanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
