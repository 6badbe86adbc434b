//! Error types produced by the ingest crate.
//!
//! Validation never fails fast: every rule is evaluated and the failures are
//! collected into a single [`FieldViolations`] map keyed by the record's wire
//! field names, so an HTTP layer can render per-field errors directly.
//!
//! ```rust
//! use ingest::{validate, IngestConfig, LogEntryRequest};
//!
//! let violations = validate(LogEntryRequest::default(), &IngestConfig::default())
//!     .into_result()
//!     .unwrap_err();
//!
//! assert!(violations.contains("level"));
//! assert!(violations.contains("message"));
//! assert!(violations.contains("service"));
//! ```
use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Field-level validation failures, `field name -> reason`.
///
/// Each field carries at most one reason: the first rule it failed.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
#[error("invalid log record: {}", render(.0))]
pub struct FieldViolations(BTreeMap<String, String>);

fn render(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(field, reason)| format!("{field}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FieldViolations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation unless the field already has one.
    pub fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Field names in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
