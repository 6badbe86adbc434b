//! Configuration types for the ingest pipeline.
//!
//! [`IngestConfig`] controls field length limits and the environment default
//! applied during enrichment. It is cheap to clone and deserializes from any
//! serde-compatible configuration source (TOML, YAML, environment variables).
//!
//! # Quick Start
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default();
//! config.validate().expect("defaults are valid");
//! assert_eq!(config.default_environment, "unknown");
//! assert_eq!(config.limits.message, 10_000);
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::fields;

/// Runtime configuration for validation and enrichment.
///
/// # Serialization
///
/// ```toml
/// [ingest]
/// default_environment = "unknown"
///
/// [ingest.limits]
/// message = 10000
/// service = 100
/// host = 255
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Semantic version of the ingest configuration.
    ///
    /// Default: `1`
    pub version: u32,

    /// Value assigned to `environment` when the caller omits it.
    ///
    /// Default: `"unknown"`
    pub default_environment: String,

    /// Maximum lengths, in characters, of the bounded string fields.
    pub limits: FieldLimits,
}

/// Maximum character counts for bounded string fields.
///
/// Lengths are counted in Unicode scalar values, not bytes, so a 100
/// character service name made of multi-byte characters is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLimits {
    /// Default: `10_000`
    pub message: usize,
    /// Default: `100`
    pub service: usize,
    /// Default: `255`
    pub host: usize,
    /// Default: `100`
    pub environment: usize,
    /// Default: `100`
    pub trace_id: usize,
    /// Default: `100`
    pub span_id: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            message: 10_000,
            service: 100,
            host: 255,
            environment: 100,
            trace_id: 100,
            span_id: 100,
        }
    }
}

impl FieldLimits {
    fn entries(&self) -> [(&'static str, usize); 6] {
        [
            (fields::MESSAGE, self.message),
            (fields::SERVICE, self.service),
            (fields::HOST, self.host),
            (fields::ENVIRONMENT, self.environment),
            (fields::TRACE_ID, self.trace_id),
            (fields::SPAN_ID, self.span_id),
        ]
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            default_environment: "unknown".into(),
            limits: FieldLimits::default(),
        }
    }
}

/// Errors that can occur when validating an [`IngestConfig`].
///
/// These are start-up issues, surfaced before any request is served.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("ingest.version must be >= 1")]
    InvalidVersion,

    /// A limit of zero would reject every non-empty value.
    #[error("limit for `{field}` must be greater than zero")]
    ZeroLimit { field: &'static str },

    /// The default environment must itself pass the environment limit,
    /// otherwise enrichment would produce a record validation would reject.
    #[error("default_environment is {len} characters, exceeds environment limit of {limit}")]
    DefaultEnvironmentTooLong { len: usize, limit: usize },
}

impl IngestConfig {
    /// Validates internal consistency of this configuration.
    ///
    /// ```rust
    /// use ingest::{ConfigError, FieldLimits, IngestConfig};
    ///
    /// let config = IngestConfig {
    ///     limits: FieldLimits { host: 0, ..Default::default() },
    ///     ..Default::default()
    /// };
    /// assert_eq!(config.validate(), Err(ConfigError::ZeroLimit { field: "host" }));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::InvalidVersion);
        }

        if let Some((field, _)) = self.limits.entries().into_iter().find(|(_, l)| *l == 0) {
            return Err(ConfigError::ZeroLimit { field });
        }

        let len = self.default_environment.chars().count();
        if len > self.limits.environment {
            return Err(ConfigError::DefaultEnvironmentTooLong {
                len,
                limit: self.limits.environment,
            });
        }

        Ok(())
    }
}
