//! Raw calendar entries as they come out of a school feed.
//!
//! [`RawEvent`] keeps the feed's view of an entry (UID, status, timezone
//! flavor of its times) before [`normalize_event`](crate::normalize_event)
//! turns it into a [`SchoolEvent`](schoolcal_core::SchoolEvent).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The time of a raw feed entry.
///
/// iCalendar times come in three shapes: absolute UTC (`...Z`), floating or
/// TZID-qualified local time, and date-only for all-day entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// An absolute instant.
    Utc(DateTime<Utc>),
    /// Wall-clock time in the district's zone.
    Local(NaiveDateTime),
    /// An all-day date.
    Date(NaiveDate),
}

impl RawEventTime {
    /// Creates a RawEventTime from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::Utc(dt)
    }

    /// Creates a RawEventTime from a local wall-clock datetime.
    pub fn from_local(dt: NaiveDateTime) -> Self {
        Self::Local(dt)
    }

    /// Creates a RawEventTime from a date (all-day entry).
    pub fn from_date(date: NaiveDate) -> Self {
        Self::Date(date)
    }

    /// Returns true if this is an all-day entry.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// A raw entry from a school calendar feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// The feed's UID for the entry.
    pub uid: String,
    /// When the entry starts.
    pub start: RawEventTime,
    /// When the entry ends, if given.
    pub end: Option<RawEventTime>,
    /// SUMMARY.
    pub summary: Option<String>,
    /// DESCRIPTION.
    pub description: Option<String>,
    /// LOCATION.
    pub location: Option<String>,
    /// STATUS (e.g. "Confirmed", "Cancelled").
    pub status: Option<String>,
}

impl RawEvent {
    /// Creates a new raw event with the minimum required fields.
    pub fn new(uid: impl Into<String>, start: RawEventTime) -> Self {
        Self {
            uid: uid.into(),
            start,
            end: None,
            summary: None,
            description: None,
            location: None,
            status: None,
        }
    }

    /// Returns the effective title, falling back to "(No title)" if empty.
    pub fn effective_title(&self) -> &str {
        self.summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("(No title)")
    }

    /// Returns true if the feed marks the entry as cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }

    /// Returns true if this is an all-day entry.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    /// Builder method to set the end time.
    pub fn with_end(mut self, end: RawEventTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
