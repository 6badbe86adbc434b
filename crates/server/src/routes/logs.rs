use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ingest::{IngestionReceipt, LogEntryRequest};
use std::sync::Arc;

/// Accept one log entry
///
/// Validates, enriches and publishes the entry. Returns 202 with a receipt
/// once the broker has taken the record.
///
/// # Request Body
///
/// ```json
/// {
///   "level": "ERROR",
///   "message": "Database connection failed",
///   "service": "user-service",
///   "host": "app-01",
///   "traceId": "abc123",
///   "metadata": {"retries": 3}
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "id": "7f1c0c1e-2a53-4c43-9b2b-0c8d4f2e9a10",
///   "status": "accepted",
///   "timestamp": "2024-03-15T10:30:00.123Z",
///   "message": "Log entry accepted for processing"
/// }
/// ```
pub async fn ingest_log(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<LogEntryRequest>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<IngestionReceipt>)> {
    let Json(request) = payload.map_err(ServerError::from)?;
    let receipt = state.service.ingest(request).await?;
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}
