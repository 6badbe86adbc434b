//! Core data model types for the ingest crate.
//!
//! These types represent the shape of inbound log requests, the validated
//! record, the enriched record handed to the broker, and the receipt returned
//! to callers.
//!
//! # Type Flow
//!
//! ```text
//! LogEntryRequest            (every field optional, level is a raw string)
//!         │  validate()
//!         ▼
//! LogRecord                  (level typed, required fields present)
//!         │  enrich()
//!         ▼
//! EnrichedRecord             (timestamp/environment/metadata always present,
//!                             metadata carries logId + ingestedAt)
//!         │  publish
//!         ▼
//! IngestionReceipt           (id == metadata.logId)
//! ```
//!
//! # Examples
//!
//! ```rust
//! use ingest::LogEntryRequest;
//!
//! let request: LogEntryRequest = serde_json::from_str(
//!     r#"{"level":"INFO","message":"Service started","service":"billing","traceId":"abc"}"#,
//! ).unwrap();
//!
//! assert_eq!(request.level.as_deref(), Some("INFO"));
//! assert_eq!(request.trace_id.as_deref(), Some("abc"));
//! assert!(request.metadata.is_none());
//! ```
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Open-ended metadata attached to a record.
///
/// Values are `serde_json::Value`, a tagged union of null, bool, number,
/// string, array and object. Keys are kept sorted so serialization is
/// deterministic.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Wire names of the record fields, used as violation keys.
pub mod fields {
    pub const TIMESTAMP: &str = "timestamp";
    pub const LEVEL: &str = "level";
    pub const MESSAGE: &str = "message";
    pub const SERVICE: &str = "service";
    pub const HOST: &str = "host";
    pub const ENVIRONMENT: &str = "environment";
    pub const TRACE_ID: &str = "traceId";
    pub const SPAN_ID: &str = "spanId";
    pub const METADATA: &str = "metadata";
}

/// Log severity levels.
///
/// The set is closed and matched case-sensitively: `"INFO"` parses,
/// `"info"` does not.
///
/// ```rust
/// use ingest::LogLevel;
///
/// assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
/// assert!("warn".parse::<LogLevel>().is_err());
/// assert_eq!(LogLevel::Trace.to_string(), "TRACE");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Every accepted level, in severity order.
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the five level names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0:?}")]
pub struct UnknownLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

/// A candidate log record exactly as it arrived.
///
/// Every field is optional so that a missing `level` or `message` surfaces as
/// a field violation from [`validate`](crate::validate) rather than as a
/// decoding error. `level` and `timestamp` stay raw strings for the same
/// reason. Unknown JSON fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEntryRequest {
    pub timestamp: Option<String>,
    pub level: Option<String>,
    pub message: Option<String>,
    pub service: Option<String>,
    pub host: Option<String>,
    pub environment: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub metadata: Option<Metadata>,
}

/// A record that passed validation but has not been enriched yet.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub level: LogLevel,
    pub message: String,
    pub service: String,
    pub host: Option<String>,
    pub environment: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub metadata: Option<Metadata>,
}

/// A record after enrichment; this is what gets published.
///
/// `timestamp`, `environment` and `metadata` are no longer optional, and
/// `metadata` always contains `logId` and `ingestedAt`. The generated id is
/// also kept out-of-band (see [`EnrichedRecord::log_id`]) so callers do not
/// need to dig it back out of the metadata map.
///
/// Serialized form (optional fields render as `null`):
///
/// ```json
/// {
///   "timestamp": "2024-01-01T00:00:00.000Z",
///   "level": "INFO",
///   "message": "Service started",
///   "service": "billing",
///   "host": null,
///   "environment": "unknown",
///   "traceId": null,
///   "spanId": null,
///   "metadata": { "ingestedAt": "2024-01-01T00:00:00.012Z", "logId": "..." }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub service: String,
    pub host: Option<String>,
    pub environment: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub metadata: Metadata,
    #[serde(skip)]
    pub(crate) log_id: Uuid,
}

impl EnrichedRecord {
    /// The identifier generated for this ingestion event.
    pub fn log_id(&self) -> Uuid {
        self.log_id
    }
}

/// Outcome tag carried by a successful receipt.
pub const ACCEPTED_STATUS: &str = "accepted";

/// Human-readable confirmation carried by a successful receipt.
pub const ACCEPTED_MESSAGE: &str = "Log entry accepted for processing";

/// Synchronous response for an accepted record.
///
/// ```rust
/// use ingest::{IngestionReceipt, ACCEPTED_STATUS};
/// use uuid::Uuid;
///
/// let id = Uuid::new_v4();
/// let receipt = IngestionReceipt::accepted(id);
/// assert_eq!(receipt.id, id.to_string());
/// assert_eq!(receipt.status, ACCEPTED_STATUS);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReceipt {
    pub id: String,
    pub status: String,
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl IngestionReceipt {
    /// Builds an `accepted` receipt stamped with the current time.
    pub fn accepted(log_id: Uuid) -> Self {
        Self {
            id: log_id.to_string(),
            status: ACCEPTED_STATUS.to_string(),
            timestamp: Utc::now(),
            message: ACCEPTED_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn level_parsing_is_exact() {
        for level in LogLevel::ALL {
            assert_eq!(level.as_str().parse::<LogLevel>(), Ok(level));
        }
        for bad in ["info", "Info", "FATAL", "", " INFO"] {
            assert!(bad.parse::<LogLevel>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn request_uses_camel_case_names() {
        let request: LogEntryRequest = serde_json::from_value(json!({
            "level": "DEBUG",
            "traceId": "t-1",
            "spanId": "s-1",
            "metadata": {"attempt": 3, "tags": ["a", "b"], "nested": {"ok": true}},
            "unexpected": "ignored"
        }))
        .expect("request decodes");

        assert_eq!(request.trace_id.as_deref(), Some("t-1"));
        assert_eq!(request.span_id.as_deref(), Some("s-1"));
        let metadata = request.metadata.expect("metadata present");
        assert_eq!(metadata["attempt"], json!(3));
        assert_eq!(metadata["nested"]["ok"], json!(true));
        assert!(request.message.is_none());
    }

    #[test]
    fn empty_object_decodes_to_all_none() {
        let request: LogEntryRequest = serde_json::from_str("{}").expect("decodes");
        assert_eq!(request, LogEntryRequest::default());
    }

    #[test]
    fn receipt_serializes_wire_timestamp() {
        let mut receipt = IngestionReceipt::accepted(Uuid::nil());
        receipt.timestamp = crate::timestamp::parse("2024-05-01T10:20:30.456Z").unwrap();
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["timestamp"], json!("2024-05-01T10:20:30.456Z"));
        assert_eq!(value["status"], json!("accepted"));
        assert_eq!(value["message"], json!(ACCEPTED_MESSAGE));
    }
}
