//! Calendar-boundary resolution in a fixed reference zone.
//!
//! Subscription access ends at local midnight on the first day of the next month
//! (or next year) in the business's reference zone, expressed as a UTC instant.
//! All arithmetic happens on local wall-clock dates and is converted to UTC last,
//! so DST transitions never shift the boundary by an hour.

use chrono::{Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::domain::foundation::{Timestamp, ValidationError};

/// IANA name of the default reference zone.
pub const DEFAULT_REFERENCE_ZONE: &str = "America/New_York";

/// Longest DST gap we will step across when local midnight does not exist.
const MAX_GAP_MINUTES: i64 = 180;

/// Resolves month and year boundaries for a reference time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarBoundaries {
    zone: Tz,
}

impl CalendarBoundaries {
    /// Creates a resolver for the given zone.
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// Creates a resolver from an IANA zone name such as `Europe/Berlin`.
    pub fn from_zone_name(name: &str) -> Result<Self, ValidationError> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|e| ValidationError::invalid_format("reference_time_zone", e.to_string()))
    }

    /// The reference zone.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// UTC instant of 00:00 local time on the 1st of the month after `now`'s local month.
    pub fn next_month_boundary(&self, now: &Timestamp) -> Timestamp {
        let local = now.as_datetime().with_timezone(&self.zone);
        let (year, month) = if local.month() == 12 {
            (local.year() + 1, 1)
        } else {
            (local.year(), local.month() + 1)
        };
        self.local_midnight(year, month)
    }

    /// UTC instant of 00:00 local time on January 1st of the year after `now`'s local year.
    pub fn next_year_boundary(&self, now: &Timestamp) -> Timestamp {
        let local = now.as_datetime().with_timezone(&self.zone);
        self.local_midnight(local.year() + 1, 1)
    }

    fn local_midnight(&self, year: i32, month: u32) -> Timestamp {
        let date = NaiveDate::from_ymd_opt(year, month, 1)
            .expect("first day of month within supported date range");
        resolve_local(self.zone, date.and_time(chrono::NaiveTime::MIN))
    }
}

impl Default for CalendarBoundaries {
    fn default() -> Self {
        Self::new(chrono_tz::America::New_York)
    }
}

/// Converts a local wall-clock time to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Nonexistent times
/// (DST spring-forward) resolve to the first valid local minute after them.
pub(crate) fn resolve_local(zone: Tz, local: NaiveDateTime) -> Timestamp {
    let mut candidate = local;
    for _ in 0..=MAX_GAP_MINUTES {
        match zone.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Timestamp::from_datetime(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => {
                return Timestamp::from_datetime(earliest.with_timezone(&Utc))
            }
            LocalResult::None => candidate += Duration::minutes(1),
        }
    }
    Timestamp::from_datetime(Utc.from_utc_datetime(&local))
}

/// Next-month boundary in the default reference zone.
pub fn next_month_boundary(now: &Timestamp) -> Timestamp {
    CalendarBoundaries::default().next_month_boundary(now)
}

/// Next-year boundary in the default reference zone.
pub fn next_year_boundary(now: &Timestamp) -> Timestamp {
    CalendarBoundaries::default().next_year_boundary(now)
}
