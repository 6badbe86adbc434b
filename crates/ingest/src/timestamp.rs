//! Wire format helpers for UTC timestamps.
//!
//! Every timestamp leaving the service (record `timestamp`, `metadata.ingestedAt`,
//! receipt and error bodies) is rendered as `yyyy-MM-dd'T'HH:mm:ss.SSS'Z'`.
//! Use with `#[serde(with = "crate::timestamp")]`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Renders a timestamp with millisecond precision and a literal `Z` suffix.
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp (which includes the wire format) into UTC.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw.trim()).map(|ts| ts.with_timezone(&Utc))
}

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_millis_and_zulu_suffix() {
        let ts = Utc
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("valid timestamp");
        assert_eq!(format(&ts), "2024-03-09T07:05:01.000Z");
    }

    #[test]
    fn parse_accepts_wire_format_and_offsets() {
        let wire = parse("2024-01-01T12:00:00.250Z").expect("wire format parses");
        assert_eq!(format(&wire), "2024-01-01T12:00:00.250Z");

        let offset = parse("2024-01-01T14:00:00+02:00").expect("offset parses");
        assert_eq!(format(&offset), "2024-01-01T12:00:00.000Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("yesterday").is_err());
        assert!(parse("2024-13-01T00:00:00Z").is_err());
    }
}
