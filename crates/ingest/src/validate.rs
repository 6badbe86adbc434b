//! Validation of inbound log requests.
//!
//! [`validate`] turns a [`LogEntryRequest`] into either a typed [`LogRecord`]
//! or the complete set of [`FieldViolations`]. It has no side effects and
//! never panics on odd-but-well-formed input; empty optional strings are fine.
//!
//! # Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `level` | required, one of ERROR/WARN/INFO/DEBUG/TRACE (exact case) |
//! | `message` | required, not blank, at most `limits.message` characters |
//! | `service` | required, not blank, at most `limits.service` characters |
//! | `host`, `environment`, `traceId`, `spanId` | optional, bounded length |
//! | `timestamp` | optional, RFC 3339 / `yyyy-MM-dd'T'HH:mm:ss.SSS'Z'` |
use crate::config::{FieldLimits, IngestConfig};
use crate::error::FieldViolations;
use crate::timestamp;
use crate::types::{fields, LogEntryRequest, LogLevel, LogRecord};

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(LogRecord),
    Invalid(FieldViolations),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn into_result(self) -> Result<LogRecord, FieldViolations> {
        match self {
            Validation::Valid(record) => Ok(record),
            Validation::Invalid(violations) => Err(violations),
        }
    }
}

/// Validates a candidate record against the configured limits.
///
/// ```rust
/// use ingest::{validate, IngestConfig, LogEntryRequest, LogLevel, Validation};
///
/// let request = LogEntryRequest {
///     level: Some("INFO".into()),
///     message: Some("Service started".into()),
///     service: Some("test-service".into()),
///     ..Default::default()
/// };
///
/// match validate(request, &IngestConfig::default()) {
///     Validation::Valid(record) => assert_eq!(record.level, LogLevel::Info),
///     Validation::Invalid(v) => panic!("unexpected violations: {v}"),
/// }
/// ```
pub fn validate(request: LogEntryRequest, cfg: &IngestConfig) -> Validation {
    let LogEntryRequest {
        timestamp,
        level,
        message,
        service,
        host,
        environment,
        trace_id,
        span_id,
        metadata,
    } = request;
    let limits: &FieldLimits = &cfg.limits;
    let mut violations = FieldViolations::new();

    // A blank timestamp counts as absent and gets defaulted during enrichment.
    let timestamp = match timestamp.as_deref() {
        None => None,
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => match timestamp::parse(raw) {
            Ok(ts) => Some(ts),
            Err(_) => {
                violations.push(
                    fields::TIMESTAMP,
                    "Timestamp must match yyyy-MM-dd'T'HH:mm:ss.SSS'Z'",
                );
                None
            }
        },
    };

    let level = match level.as_deref() {
        None => {
            violations.push(fields::LEVEL, "Log level is required");
            None
        }
        Some(raw) => match raw.parse::<LogLevel>() {
            Ok(level) => Some(level),
            Err(_) => {
                violations.push(
                    fields::LEVEL,
                    "Log level must be one of: ERROR, WARN, INFO, DEBUG, TRACE",
                );
                None
            }
        },
    };

    let message = required_text(
        &mut violations,
        fields::MESSAGE,
        message,
        limits.message,
        "Message",
    );
    let service = required_text(
        &mut violations,
        fields::SERVICE,
        service,
        limits.service,
        "Service name",
    );
    check_length(&mut violations, fields::HOST, host.as_deref(), limits.host, "Host name");
    check_length(
        &mut violations,
        fields::ENVIRONMENT,
        environment.as_deref(),
        limits.environment,
        "Environment",
    );
    check_length(
        &mut violations,
        fields::TRACE_ID,
        trace_id.as_deref(),
        limits.trace_id,
        "Trace ID",
    );
    check_length(
        &mut violations,
        fields::SPAN_ID,
        span_id.as_deref(),
        limits.span_id,
        "Span ID",
    );

    match (level, message, service) {
        (Some(level), Some(message), Some(service)) if violations.is_empty() => {
            Validation::Valid(LogRecord {
                timestamp,
                level,
                message,
                service,
                host,
                environment,
                trace_id,
                span_id,
                metadata,
            })
        }
        _ => Validation::Invalid(violations),
    }
}

/// Required, non-blank, bounded. Returns the value untouched when it passes.
fn required_text(
    violations: &mut FieldViolations,
    field: &str,
    value: Option<String>,
    limit: usize,
    label: &str,
) -> Option<String> {
    match value {
        Some(text) if !text.trim().is_empty() => {
            if exceeds(&text, limit) {
                violations.push(field, format!("{label} must not exceed {limit} characters"));
                None
            } else {
                Some(text)
            }
        }
        _ => {
            violations.push(field, format!("{label} is required"));
            None
        }
    }
}

fn check_length(
    violations: &mut FieldViolations,
    field: &str,
    value: Option<&str>,
    limit: usize,
    label: &str,
) {
    if matches!(value, Some(text) if exceeds(text, limit)) {
        violations.push(field, format!("{label} must not exceed {limit} characters"));
    }
}

fn exceeds(text: &str, limit: usize) -> bool {
    // Short-circuits on long strings instead of counting every char.
    text.chars().nth(limit).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_request() -> LogEntryRequest {
        LogEntryRequest {
            level: Some("INFO".into()),
            message: Some("Service started".into()),
            service: Some("test-service".into()),
            ..Default::default()
        }
    }

    fn violations(request: LogEntryRequest) -> FieldViolations {
        match validate(request, &IngestConfig::default()) {
            Validation::Invalid(v) => v,
            Validation::Valid(record) => panic!("expected violations, got {record:?}"),
        }
    }

    #[test]
    fn minimal_request_is_valid() {
        let record = validate(valid_request(), &IngestConfig::default())
            .into_result()
            .expect("valid");
        assert_eq!(record.level, LogLevel::Info);
        assert_eq!(record.message, "Service started");
        assert!(record.timestamp.is_none());
        assert!(record.environment.is_none());
        assert!(record.metadata.is_none());
    }

    #[test]
    fn empty_request_reports_all_required_fields() {
        let v = violations(LogEntryRequest::default());
        let fields: Vec<&str> = v.fields().collect();
        assert_eq!(fields, vec!["level", "message", "service"]);
        assert_eq!(v.get("level"), Some("Log level is required"));
        assert_eq!(v.get("message"), Some("Message is required"));
        assert_eq!(v.get("service"), Some("Service name is required"));
    }

    #[test]
    fn level_outside_closed_set_is_rejected() {
        for bad in ["info", "FATAL", "", "WARNING"] {
            let v = violations(LogEntryRequest {
                level: Some(bad.into()),
                ..valid_request()
            });
            assert_eq!(v.fields().collect::<Vec<_>>(), vec!["level"], "level {bad:?}");
            assert!(v.get("level").unwrap().contains("must be one of"));
        }
    }

    #[test]
    fn blank_required_strings_are_rejected() {
        let v = violations(LogEntryRequest {
            message: Some("   \t\n".into()),
            service: Some("".into()),
            ..valid_request()
        });
        assert_eq!(v.get("message"), Some("Message is required"));
        assert_eq!(v.get("service"), Some("Service name is required"));
    }

    #[test]
    fn message_limit_boundary() {
        let at_limit = LogEntryRequest {
            message: Some("a".repeat(10_000)),
            ..valid_request()
        };
        assert!(validate(at_limit, &IngestConfig::default()).is_valid());

        let v = violations(LogEntryRequest {
            message: Some("a".repeat(10_001)),
            ..valid_request()
        });
        assert_eq!(
            v.get("message"),
            Some("Message must not exceed 10000 characters")
        );
    }

    #[test]
    fn length_is_counted_in_characters_not_bytes() {
        // 100 three-byte characters is 300 bytes but still within the limit.
        let request = LogEntryRequest {
            service: Some("\u{65e5}".repeat(100)),
            ..valid_request()
        };
        assert!(validate(request, &IngestConfig::default()).is_valid());
    }

    #[test]
    fn optional_field_limit_boundaries() {
        let cases: [(&str, usize, fn(&mut LogEntryRequest, String)); 5] = [
            ("service", 100, |r, s| r.service = Some(s)),
            ("host", 255, |r, s| r.host = Some(s)),
            ("environment", 100, |r, s| r.environment = Some(s)),
            ("traceId", 100, |r, s| r.trace_id = Some(s)),
            ("spanId", 100, |r, s| r.span_id = Some(s)),
        ];

        for (field, limit, set) in cases {
            let mut at_limit = valid_request();
            set(&mut at_limit, "x".repeat(limit));
            assert!(
                validate(at_limit, &IngestConfig::default()).is_valid(),
                "{field} at limit should pass"
            );

            let mut over = valid_request();
            set(&mut over, "x".repeat(limit + 1));
            let v = violations(over);
            assert_eq!(v.fields().collect::<Vec<_>>(), vec![field]);
        }
    }

    #[test]
    fn empty_optional_strings_are_accepted() {
        let request = LogEntryRequest {
            host: Some(String::new()),
            environment: Some(String::new()),
            trace_id: Some(String::new()),
            span_id: Some(String::new()),
            metadata: Some(Default::default()),
            ..valid_request()
        };
        let record = validate(request, &IngestConfig::default())
            .into_result()
            .expect("valid");
        assert_eq!(record.environment.as_deref(), Some(""));
    }

    #[test]
    fn multiple_violations_are_collected() {
        let v = violations(LogEntryRequest {
            level: Some("LOUD".into()),
            message: None,
            service: Some("s".repeat(101)),
            host: Some("h".repeat(256)),
            trace_id: Some("t".repeat(101)),
            ..Default::default()
        });
        assert_eq!(
            v.fields().collect::<Vec<_>>(),
            vec!["host", "level", "message", "service", "traceId"]
        );
    }

    #[test]
    fn unparseable_timestamp_is_a_field_violation() {
        let v = violations(LogEntryRequest {
            timestamp: Some("not-a-time".into()),
            ..valid_request()
        });
        assert_eq!(v.fields().collect::<Vec<_>>(), vec!["timestamp"]);
    }

    #[test]
    fn blank_timestamp_is_treated_as_absent() {
        for blank in ["", "   "] {
            let record = validate(
                LogEntryRequest {
                    timestamp: Some(blank.into()),
                    ..valid_request()
                },
                &IngestConfig::default(),
            )
            .into_result()
            .expect("blank timestamp should be accepted");
            assert!(record.timestamp.is_none(), "timestamp {blank:?}");
        }
    }

    #[test]
    fn custom_limits_are_reported_in_reason() {
        let cfg = IngestConfig {
            limits: FieldLimits {
                message: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        let request = LogEntryRequest {
            message: Some("too long".into()),
            ..valid_request()
        };
        let v = validate(request, &cfg).into_result().unwrap_err();
        assert_eq!(v.get("message"), Some("Message must not exceed 5 characters"));
    }

    #[test]
    fn metadata_passes_through_untouched() {
        let metadata = json!({"region": "eu", "retries": 2}).as_object().cloned();
        let record = validate(
            LogEntryRequest {
                metadata: metadata.clone(),
                ..valid_request()
            },
            &IngestConfig::default(),
        )
        .into_result()
        .expect("valid");
        assert_eq!(record.metadata, metadata);
    }
}
