//! # Temporal Types — UTC-Only Timestamps
//!
//! `Timestamp` stamps findings and reports. It is always UTC and truncated
//! to seconds, so two reports rendered from the same run carry identical
//! time strings regardless of the host timezone.
//!
//! Non-UTC inputs are **rejected at construction** by [`Timestamp::parse`];
//! there is no silent offset conversion.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EagleEyeError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Wrap a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, EagleEyeError> {
        if !s.ends_with('Z') {
            return Err(EagleEyeError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| EagleEyeError::InvalidTimestamp(format!("{s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as ISO8601 with Z suffix (e.g. `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Render as `YYYYmmdd_HHMMSS`, the form used in report file names.
    pub fn to_file_stamp(&self) -> String {
        self.0.format("%Y%m%d_%H%M%S").to_string()
    }

    /// Render as `YYYY-mm-dd HH:MM:SS` for human-facing report headers.
    pub fn to_display_string(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 31, 9, 15, 7).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(999_000_000).unwrap());
        assert_eq!(ts.to_iso8601(), "2026-03-31T09:15:07Z");
    }

    #[test]
    fn test_file_stamp_format() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 31, 9, 15, 7).unwrap();
        let ts = Timestamp::from_utc(dt);
        assert_eq!(ts.to_file_stamp(), "20260331_091507");
        assert_eq!(ts.to_display_string(), "2026-03-31 09:15:07");
    }

    #[test]
    fn test_parse_z_suffix_accepted() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        assert_eq!(format!("{ts}"), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_offset_rejected() {
        assert!(Timestamp::parse("2026-01-15T12:00:00+08:00").is_err());
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
    }

    #[test]
    fn test_parse_garbage_rejected() {
        assert!(Timestamp::parse("yesterdayZ").is_err());
    }
}
