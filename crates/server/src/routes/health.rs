use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

const SERVICE_NAME: &str = "log-ingestion";

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": ingest::timestamp::format(&chrono::Utc::now()),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness check endpoint
/// Returns 200 once the broker topology is declared, 503 before that or
/// after a failed declaration
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let topology = state.topology.state();
    let (status, label) = if state.topology.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": SERVICE_NAME,
            "timestamp": ingest::timestamp::format(&chrono::Utc::now()),
            "uptime_seconds": uptime_seconds(),
            "components": {
                "api": "ready",
                "topology": topology.as_str(),
            }
        })),
    )
}

/// Service health under the logs API
pub async fn logs_health() -> impl IntoResponse {
    Json(json!({
        "status": "UP",
        "service": SERVICE_NAME,
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| ServerError::NotFound("Metrics are disabled".to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
