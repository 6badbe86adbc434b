use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use broker::PublishError;
use chrono::Utc;
use ingest::FieldViolations;
use logingest::PipelineError;
use serde_json::{json, Value};

pub type ServerResult<T> = Result<T, ServerError>;

/// Message returned for any publish failure. The cause stays in the logs.
pub const PUBLISH_FAILED_MESSAGE: &str = "Failed to ingest log entry";

/// Message returned for any unclassified failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldViolations),

    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] PublishError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::Malformed(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Ingestion(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Value of the `error` field in the response body
    pub fn error_label(&self) -> &'static str {
        match self {
            ServerError::Validation(_) => "Validation Failed",
            ServerError::Malformed(_) => "Malformed Request",
            ServerError::PayloadTooLarge(_) => "Payload Too Large",
            ServerError::Ingestion(_) => "Log Ingestion Failed",
            ServerError::Internal(_) => "Internal Server Error",
            ServerError::NotFound(_) => "Not Found",
        }
    }

    fn body(&self) -> Value {
        let mut body = json!({
            "timestamp": ingest::timestamp::format(&Utc::now()),
            "status": self.status_code().as_u16(),
            "error": self.error_label(),
        });
        let detail = match self {
            ServerError::Validation(violations) => ("errors", json!(violations)),
            ServerError::Malformed(message)
            | ServerError::PayloadTooLarge(message)
            | ServerError::NotFound(message) => ("message", json!(message)),
            ServerError::Ingestion(_) => ("message", json!(PUBLISH_FAILED_MESSAGE)),
            ServerError::Internal(_) => ("message", json!(INTERNAL_ERROR_MESSAGE)),
        };
        if let Some(map) = body.as_object_mut() {
            map.insert(detail.0.to_string(), detail.1);
        }
        body
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let ServerError::Internal(detail) = &self {
            tracing::error!(error = %detail, "unclassified_failure");
        }
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(violations) => ServerError::Validation(violations),
            PipelineError::Publish(err) => ServerError::Ingestion(err),
            PipelineError::Internal(detail) => ServerError::Internal(detail),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(rejection.body_text())
        } else {
            ServerError::Malformed(rejection.body_text())
        }
    }
}
