//! Log Ingest Layer
//!
//! This is where log records enter the pipeline. We take a raw request,
//! check it field by field, fill in what the caller left out, and hand back a
//! record that is ready to be published.
//!
//! ## What we do here
//!
//! - **Validate** - Required fields, closed-set `level`, length limits. All
//!   violations are collected, not just the first.
//! - **Enrich** - Default `timestamp`/`environment`/`metadata`, generate a
//!   UUID v4 log id, stamp `metadata.logId` and `metadata.ingestedAt`.
//! - **Log everything** - Structured logs via tracing.
//!
//! ## Main entry point
//!
//! Call [`ingest`] with a [`LogEntryRequest`] and [`IngestConfig`], get back
//! an [`EnrichedRecord`] or the [`FieldViolations`]. The two halves are also
//! exposed separately as [`validate`] and [`enrich`].
//!
//! ## Example
//!
//! ```
//! use ingest::{ingest, IngestConfig, LogEntryRequest};
//!
//! let config = IngestConfig::default();
//! let request = LogEntryRequest {
//!     level: Some("INFO".into()),
//!     message: Some("Service started".into()),
//!     service: Some("test-service".into()),
//!     ..Default::default()
//! };
//!
//! let record = ingest(request, &config).unwrap();
//!
//! assert_eq!(record.environment, "unknown");
//! assert_eq!(record.metadata["logId"], record.log_id().to_string());
//! ```
//!
use std::time::Instant;

use tracing::{debug, warn};

mod config;
mod enrich;
mod error;
pub mod timestamp;
mod types;
mod validate;

pub use crate::config::{ConfigError, FieldLimits, IngestConfig};
pub use crate::enrich::{enrich, enrich_at, INGESTED_AT_KEY, LOG_ID_KEY};
pub use crate::error::FieldViolations;
pub use crate::types::{
    fields, EnrichedRecord, IngestionReceipt, LogEntryRequest, LogLevel, LogRecord, Metadata,
    UnknownLevel, ACCEPTED_MESSAGE, ACCEPTED_STATUS,
};
pub use crate::validate::{validate, Validation};

/// Validates then enriches a request.
///
/// Nothing is enriched unless validation passes, so a rejected request never
/// gets a log id.
pub fn ingest(
    request: LogEntryRequest,
    cfg: &IngestConfig,
) -> Result<EnrichedRecord, FieldViolations> {
    let start = Instant::now();
    let service_hint = request.service.clone();

    match validate(request, cfg) {
        Validation::Valid(record) => {
            let enriched = enrich(record, cfg);
            debug!(
                log_id = %enriched.log_id(),
                service = %enriched.service,
                level = %enriched.level,
                elapsed_micros = start.elapsed().as_micros(),
                "ingest_success"
            );
            Ok(enriched)
        }
        Validation::Invalid(violations) => {
            warn!(
                service = ?service_hint,
                violations = %violations,
                elapsed_micros = start.elapsed().as_micros(),
                "ingest_rejected"
            );
            Err(violations)
        }
    }
}
