//! Daily time windows.
//!
//! A time filter names a window by time of day (`"09:00:00"` to
//! `"17:00:00"`) in some timezone. [`TimeWindow`] pins that window to the
//! calendar date of a concrete event so that membership becomes an ordinary
//! instant comparison.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::FilterCause;

/// Format accepted for window bounds.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// A window pinned to one calendar day.
///
/// When `start < stop` the window is the half-open range `[start, stop)`.
/// Otherwise it wraps around midnight and covers `[start, 24:00)` together
/// with `[00:00, stop)` of the same day.
///
/// # Examples
///
/// ```
/// use sensorlogic::time::TimeWindow;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2024, 7, 15, 14, 0, 0).unwrap();
/// let window = TimeWindow::resolve("09:00:00", "17:00:00", Some("America/New_York"), at).unwrap();
/// assert!(window.contains(at));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,

    /// End of the window (exclusive).
    pub stop: DateTime<Utc>,
}

impl TimeWindow {
    /// Pins `start`/`stop` to the date `at` falls on in `timezone` (UTC when absent or empty).
    ///
    /// # Errors
    ///
    /// Returns `FilterCause::InvalidTimezone` for an unknown timezone and
    /// `FilterCause::InvalidTime` for a bound that is not `hh:mm:ss`.
    pub fn resolve(start: &str, stop: &str, timezone: Option<&str>, at: DateTime<Utc>) -> Result<Self, FilterCause> {
        let tz = parse_timezone(timezone.unwrap_or_default())?;
        let date = at.with_timezone(&tz).date_naive();
        Ok(Self {
            start: pin(tz, date, start)?,
            stop: pin(tz, date, stop)?,
        })
    }

    /// Returns true if the window wraps around midnight.
    #[must_use]
    pub fn wraps(&self) -> bool {
        self.stop <= self.start
    }

    /// Check if a timestamp falls within this window.
    #[must_use]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        if self.wraps() {
            time >= self.start || time < self.stop
        } else {
            time >= self.start && time < self.stop
        }
    }
}

/// Parses a `hh:mm:ss` bound.
///
/// # Errors
///
/// Returns `FilterCause::InvalidTime` when `value` is not a time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, FilterCause> {
    NaiveTime::parse_from_str(value, TIME_OF_DAY_FORMAT).map_err(|_| FilterCause::InvalidTime {
        value: value.to_string(),
    })
}

/// Parses an IANA timezone name; the empty name is UTC.
///
/// # Errors
///
/// Returns `FilterCause::InvalidTimezone` for an unknown name.
pub fn parse_timezone(name: &str) -> Result<Tz, FilterCause> {
    if name.is_empty() {
        return Ok(Tz::UTC);
    }
    name.parse::<Tz>()
        .map_err(|_| FilterCause::InvalidTimezone(name.to_string()))
}

fn pin(tz: Tz, date: NaiveDate, value: &str) -> Result<DateTime<Utc>, FilterCause> {
    let local = date.and_time(parse_time_of_day(value)?);
    // A wall-clock time skipped by a DST jump resolves to the instant after the gap.
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| FilterCause::InvalidTime {
            value: value.to_string(),
        })
}
