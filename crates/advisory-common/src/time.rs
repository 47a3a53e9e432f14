//! Advisory validity timestamps.
//!
//! Feeds report validity as RFC 3339 strings, naive ISO strings, or epoch
//! seconds (as numbers or numeric strings).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Display format for validity times.
pub const VALIDITY_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Parse a validity attribute into a UTC timestamp.
pub fn parse_validity(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => parse_validity_str(s.trim()),
        _ => None,
    }
}

fn parse_validity_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Without timezone (assume UTC)
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt));
    }

    s.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// Human-readable validity time, or "Unknown" when absent or unparseable.
pub fn format_validity(value: Option<&Value>) -> String {
    value
        .and_then(parse_validity)
        .map(|dt| dt.format(VALIDITY_FORMAT).to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            format_validity(Some(&json!("2024-03-01T18:55:00Z"))),
            "2024-03-01 18:55 UTC"
        );
    }

    #[test]
    fn test_offset_converted_to_utc() {
        assert_eq!(
            format_validity(Some(&json!("2024-03-01T12:00:00-06:00"))),
            "2024-03-01 18:00 UTC"
        );
    }

    #[test]
    fn test_epoch_seconds_number_and_string() {
        assert_eq!(format_validity(Some(&json!(1709319300))), "2024-03-01 18:55 UTC");
        assert_eq!(format_validity(Some(&json!("1709319300"))), "2024-03-01 18:55 UTC");
    }

    #[test]
    fn test_unknown() {
        assert_eq!(format_validity(None), "Unknown");
        assert_eq!(format_validity(Some(&json!(null))), "Unknown");
        assert_eq!(format_validity(Some(&json!("soon"))), "Unknown");
    }
}
