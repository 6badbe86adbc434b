//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the log
//! ingestion server. Routes are organized by functionality:
//!
//! - `health`: Health checks, readiness, and metrics
//! - `logs`: Log entry ingestion

pub mod health;
pub mod logs;

use crate::error::{ServerError, ServerResult};
use axum::http::{Method, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /).
///
/// # Response
///
/// ```json
/// {
///   "name": "Log Ingestion Service",
///   "version": "0.1.0",
///   "api_version": "v1",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Log Ingestion Service",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "POST /api/v1/logs",
            "GET /api/v1/logs/health",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found(method: Method, uri: Uri) -> ServerError {
    ServerError::NotFound(format!("No route for {method} {}", uri.path()))
}
