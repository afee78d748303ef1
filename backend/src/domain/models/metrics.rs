//! Time-series health metrics.
//!
//! Timestamps are stored as UTC RFC 3339 strings with fixed millisecond
//! precision (`2024-01-15T10:30:00.000Z`), so lexical order in the store is
//! chronological order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureReading {
    pub systolic: f64,
    pub diastolic: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    pub glucose_level: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub meal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    pub timestamp: String,
}

/// Canonical stored form of an instant
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a client supplied ISO 8601 timestamp.
///
/// Accepts RFC 3339 with any offset, a naive date-time (taken as UTC) or a
/// bare date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> ServiceResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(ServiceError::Validation(format!(
        "Invalid ISO 8601 timestamp: {raw}"
    )))
}

/// A range end. A bare date covers that whole day, up to its last stored
/// millisecond.
fn parse_range_end(raw: &str) -> ServiceResult<DateTime<Utc>> {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date
            .and_hms_milli_opt(23, 59, 59, 999)
            .map(|last| last.and_utc())
            .ok_or_else(|| ServiceError::Validation(format!("Invalid end date: {raw}"))),
        Err(_) => parse_timestamp(raw),
    }
}

/// Inclusive time window for metric queries; open on either side when unset.
///
/// A date-only `end` includes the whole of that day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> ServiceResult<Self> {
        let start = start
            .filter(|s| !s.trim().is_empty())
            .map(parse_timestamp)
            .transpose()?;
        let end = end
            .filter(|s| !s.trim().is_empty())
            .map(parse_range_end)
            .transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ServiceError::Validation(
                    "start must not be after end".into(),
                ));
            }
        }

        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_normalises_offsets_to_utc() {
        let parsed = parse_timestamp("2024-06-15T08:30:00-05:00").unwrap();
        assert_eq!(format_timestamp(parsed), "2024-06-15T13:30:00.000Z");
    }

    #[test]
    fn test_parse_timestamp_accepts_naive_forms() {
        assert_eq!(
            parse_timestamp("2024-06-15T08:30:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 8, 30, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2024-06-15").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_formatted_timestamps_sort_chronologically() {
        let earlier = format_timestamp(Utc.with_ymd_and_hms(2024, 1, 9, 23, 0, 0).unwrap());
        let later = format_timestamp(Utc.with_ymd_and_hms(2024, 1, 10, 1, 0, 0).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_time_range_validation() {
        let range = TimeRange::parse(Some("2024-01-01"), None).unwrap();
        assert!(range.start.is_some());
        assert!(range.end.is_none());

        assert_eq!(TimeRange::parse(Some(""), Some("  ")).unwrap(), TimeRange::default());
        assert!(TimeRange::parse(Some("2024-02-01"), Some("2024-01-01")).is_err());
    }

    #[test]
    fn test_date_only_end_covers_the_whole_day() {
        let range = TimeRange::parse(Some("2024-01-31"), Some("2024-01-31")).unwrap();
        assert_eq!(range.start, Some(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()));
        assert_eq!(
            range.end.map(format_timestamp).as_deref(),
            Some("2024-01-31T23:59:59.999Z")
        );

        let exact = TimeRange::parse(None, Some("2024-01-31T12:00:00Z")).unwrap();
        assert_eq!(exact.end, Some(Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()));
    }
}
