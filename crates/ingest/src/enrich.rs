//! Enrichment of validated records.
//!
//! Runs only after [`validate`](crate::validate) succeeded. Applies defaults
//! and attaches ingestion metadata:
//!
//! ```text
//! LogRecord
//!    │
//!    ▼
//! ┌───────────────────────────────────────┐
//! │ 1. timestamp   ← now       (if absent) │
//! │ 2. environment ← default   (if absent) │
//! │ 3. metadata    ← {}        (if absent) │
//! │ 4. generate log id (UUID v4, once)     │
//! │ 5. metadata.logId      ← log id        │
//! │    metadata.ingestedAt ← now (UTC)     │
//! └───────────────────────────────────────┘
//!    │
//!    ▼
//! EnrichedRecord
//! ```
//!
//! Other metadata keys are preserved. Caller-supplied `logId` or `ingestedAt`
//! values are overwritten.
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::timestamp;
use crate::types::{EnrichedRecord, LogRecord};

/// Metadata key holding the generated ingestion id.
pub const LOG_ID_KEY: &str = "logId";

/// Metadata key holding the ingestion time.
pub const INGESTED_AT_KEY: &str = "ingestedAt";

/// Enriches a record using the current time and a fresh random id.
///
/// ```rust
/// use ingest::{enrich, validate, IngestConfig, LogEntryRequest};
///
/// let cfg = IngestConfig::default();
/// let record = validate(
///     LogEntryRequest {
///         level: Some("ERROR".into()),
///         message: Some("disk full".into()),
///         service: Some("storage".into()),
///         ..Default::default()
///     },
///     &cfg,
/// )
/// .into_result()
/// .unwrap();
///
/// let enriched = enrich(record, &cfg);
/// assert_eq!(enriched.environment, "unknown");
/// assert_eq!(
///     enriched.metadata["logId"].as_str(),
///     Some(enriched.log_id().to_string().as_str())
/// );
/// assert!(enriched.metadata.contains_key("ingestedAt"));
/// ```
pub fn enrich(record: LogRecord, cfg: &IngestConfig) -> EnrichedRecord {
    enrich_at(record, cfg, Utc::now(), Uuid::new_v4())
}

/// Enriches a record with an explicit clock reading and id.
///
/// The same `log_id` is written into `metadata.logId` and returned through
/// [`EnrichedRecord::log_id`], which is what lets a receipt be correlated
/// with the published message.
pub fn enrich_at(
    record: LogRecord,
    cfg: &IngestConfig,
    now: DateTime<Utc>,
    log_id: Uuid,
) -> EnrichedRecord {
    let LogRecord {
        timestamp,
        level,
        message,
        service,
        host,
        environment,
        trace_id,
        span_id,
        metadata,
    } = record;

    let mut metadata = metadata.unwrap_or_default();
    metadata.insert(LOG_ID_KEY.into(), Value::String(log_id.to_string()));
    metadata.insert(
        INGESTED_AT_KEY.into(),
        Value::String(timestamp::format(&now)),
    );

    EnrichedRecord {
        timestamp: timestamp.unwrap_or(now),
        level,
        message,
        service,
        host,
        environment: environment.unwrap_or_else(|| cfg.default_environment.clone()),
        trace_id,
        span_id,
        metadata,
        log_id,
    }
}
