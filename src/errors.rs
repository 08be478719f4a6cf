use crate::{models::metadata::RecordError, services::metadata_service::MetadataError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// An HTTP-facing error: a status code plus the message returned to the client.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 502 Bad Gateway
    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::MalformedDate { .. } | RecordError::MalformedJsonList { .. } => {
                AppError::bad_request(err.to_string())
            }
            RecordError::Serialization { .. } => {
                tracing::error!(error = ?err, "record serialization failed");
                AppError::internal("internal server error")
            }
        }
    }
}

impl From<MetadataError> for AppError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(_) => AppError::not_found(err.to_string()),
            MetadataError::Record(inner) => inner.into(),
            MetadataError::Upstream(inner) => {
                tracing::error!(error = %inner, "text analysis upstream failure");
                AppError::bad_gateway("text analysis service failed")
            }
            MetadataError::Store(inner) => {
                tracing::error!(error = %inner, "metadata store failure");
                AppError::internal("internal server error")
            }
        }
    }
}
