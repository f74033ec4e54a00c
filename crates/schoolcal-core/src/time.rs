//! Time types for school calendar events.
//!
//! [`EventTime`] is the start (or end) of an event: either a wall-clock
//! datetime in the district's local time, or an all-day date. [`DayKey`] is
//! the day-truncated form used to bucket events, rendered as `YYYY-MM-DD`.
//! [`IntoDay`] is implemented by every date-like value the store accepts as a
//! query key.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Format of the canonical day string.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// When a calendar event happens.
///
/// School feeds mix timed entries (assemblies, games) with all-day entries
/// (no-school days, early release). Timed entries are kept as local wall time
/// so that day truncation matches what a parent sees on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific local datetime.
    At(NaiveDateTime),
    /// An all-day date (no specific time).
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates an `EventTime::At` from a local wall-clock datetime.
    pub fn from_local(dt: NaiveDateTime) -> Self {
        Self::At(dt)
    }

    /// Creates an `EventTime::At` from a UTC instant, expressed in `tz`.
    pub fn from_utc_in<Tz: TimeZone>(dt: DateTime<Utc>, tz: &Tz) -> Self {
        Self::At(dt.with_timezone(tz).naive_local())
    }

    /// Creates an `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the datetime if this is an `At` variant.
    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Self::At(dt) => Some(dt),
            Self::AllDay(_) => None,
        }
    }

    /// Returns the date if this is an `AllDay` variant.
    pub fn as_date(&self) -> Option<&NaiveDate> {
        match self {
            Self::AllDay(d) => Some(d),
            Self::At(_) => None,
        }
    }

    /// Returns the calendar day, discarding time-of-day.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::At(dt) => dt.date(),
            Self::AllDay(date) => *date,
        }
    }

    /// Converts to a local datetime for ordering. All-day entries sort at midnight.
    pub fn to_naive_datetime(&self) -> NaiveDateTime {
        match self {
            Self::At(dt) => *dt,
            Self::AllDay(date) => date.and_time(NaiveTime::MIN),
        }
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        // All-day entries come before a timed entry at midnight on the same day.
        self.to_naive_datetime()
            .cmp(&other.to_naive_datetime())
            .then_with(|| other.is_all_day().cmp(&self.is_all_day()))
    }
}

impl From<NaiveDate> for EventTime {
    fn from(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }
}

impl From<NaiveDateTime> for EventTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self::At(dt)
    }
}

/// Anything that can be truncated to a calendar day.
pub trait IntoDay {
    /// Returns the calendar day, discarding any time-of-day.
    fn day(&self) -> NaiveDate;
}

impl IntoDay for NaiveDate {
    fn day(&self) -> NaiveDate {
        *self
    }
}

impl IntoDay for NaiveDateTime {
    fn day(&self) -> NaiveDate {
        self.date()
    }
}

impl IntoDay for EventTime {
    fn day(&self) -> NaiveDate {
        self.date()
    }
}

impl IntoDay for DayKey {
    fn day(&self) -> NaiveDate {
        self.0
    }
}

/// Zoned datetimes truncate in their own timezone.
impl<Tz: TimeZone> IntoDay for DateTime<Tz> {
    fn day(&self) -> NaiveDate {
        self.date_naive()
    }
}

impl<T: IntoDay + ?Sized> IntoDay for &T {
    fn day(&self) -> NaiveDate {
        (**self).day()
    }
}

/// A day-truncated index key.
///
/// Displays and parses as `YYYY-MM-DD`. Two events on the same calendar day
/// share a key regardless of their time-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Truncates any date-like value to its day key.
    pub fn of(date: impl IntoDay) -> Self {
        Self(date.day())
    }

    /// Returns the underlying date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DAY_KEY_FORMAT).map(Self)
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}
