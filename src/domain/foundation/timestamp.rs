//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parses an ISO-8601 / RFC 3339 instant such as `2025-01-15T10:00:00Z`.
    ///
    /// Offsets other than `Z` are accepted and normalized to UTC.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        DateTime::parse_from_rfc3339(input.trim())
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| ValidationError::invalid_format("instant", e.to_string()))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by subtracting the specified number of days.
    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Creates a new timestamp `elapsed` earlier, saturating at the earliest representable instant.
    pub fn minus_elapsed(&self, elapsed: std::time::Duration) -> Self {
        Duration::from_std(elapsed)
            .ok()
            .and_then(|d| self.0.checked_sub_signed(d))
            .map(Self)
            .unwrap_or(Self(DateTime::<Utc>::MIN_UTC))
    }

    /// Drops sub-microsecond precision, which `TIMESTAMPTZ` cannot store.
    pub fn truncated_to_micros(&self) -> Self {
        Self(self.0.trunc_subsecs(6))
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Creates a timestamp from Unix seconds. Returns `None` when out of range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn parse_accepts_zulu_instant() {
        let ts = Timestamp::parse("2025-01-15T10:00:00Z").unwrap();
        assert_eq!(ts.as_datetime().year(), 2025);
        assert_eq!(ts.as_datetime().hour(), 10);
    }

    #[test]
    fn parse_normalizes_offsets_to_utc() {
        let ts = Timestamp::parse("2025-01-15T05:00:00-05:00").unwrap();
        assert_eq!(ts, Timestamp::parse("2025-01-15T10:00:00Z").unwrap());
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(Timestamp::parse("2025-13-45").is_err());
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn display_uses_rfc3339_with_zulu() {
        let ts = Timestamp::parse("2025-02-01T05:00:00Z").unwrap();
        assert_eq!(ts.to_string(), "2025-02-01T05:00:00Z");
    }

    #[test]
    fn timestamp_serializes_to_json() {
        let ts = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15"));
    }

    #[test]
    fn timestamp_ordering_works() {
        let ts1 = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        let ts2 = ts1.plus_secs(1);

        assert!(ts1.is_before(&ts2));
        assert!(ts2.is_after(&ts1));
        assert!(ts1 < ts2);
    }

    #[test]
    fn timestamp_from_unix_secs_works() {
        // 2024-01-15T00:00:00Z
        let ts = Timestamp::from_unix_secs(1705276800).unwrap();
        assert_eq!(ts.as_datetime().month(), 1);
        assert_eq!(ts.as_datetime().day(), 15);
        assert_eq!(ts.as_unix_secs(), 1705276800);
    }

    #[test]
    fn minus_elapsed_steps_back() {
        let ts = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        let earlier = ts.minus_elapsed(std::time::Duration::from_secs(90));
        assert_eq!(earlier, Timestamp::parse("2024-01-15T10:28:30Z").unwrap());
    }

    #[test]
    fn minus_elapsed_saturates() {
        let ts = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        let floor = ts.minus_elapsed(std::time::Duration::MAX);
        assert_eq!(floor.as_datetime(), &DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn truncated_to_micros_drops_nanos() {
        let ts = Timestamp::parse("2024-01-15T10:30:00.123456789Z").unwrap();
        assert_eq!(
            ts.truncated_to_micros(),
            Timestamp::parse("2024-01-15T10:30:00.123456Z").unwrap()
        );
    }
}
