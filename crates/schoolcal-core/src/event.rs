//! Event types for the district calendar.
//!
//! - [`SchoolEvent`]: one calendar occurrence owned by a school
//! - [`School`]: a school and the feed its calendar is published at

use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::time::{DayKey, EventTime};

/// A school in the district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    /// Short identifier stored on each event (e.g. "phs").
    pub id: String,
    /// Display name.
    pub name: String,
    /// Published iCalendar feed for this school.
    pub calendar_url: Url,
}

impl School {
    /// Creates a school from an already parsed feed URL.
    pub fn new(id: impl Into<String>, name: impl Into<String>, calendar_url: Url) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            calendar_url,
        }
    }

    /// Creates a school, parsing the feed URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn parse(
        id: impl Into<String>,
        name: impl Into<String>,
        calendar_url: impl AsRef<str>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self::new(id, name, Url::parse(calendar_url.as_ref())?))
    }
}

/// One calendar occurrence.
///
/// Equality is structural over `start`, `title` and `school`: two instances
/// describing the same occurrence compare equal even when one is pinned and
/// the other is not, or when their descriptive fields differ. That is the
/// identity used for de-duplication and pin reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolEvent {
    /// The event title.
    pub title: String,
    /// When the event starts.
    pub start: EventTime,
    /// When the event ends, if the feed says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    /// Where the event takes place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form description from the feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Id of the owning [`School`].
    pub school: String,
    /// Whether the user has pinned (favorited) this event.
    #[serde(default)]
    pub pinned: bool,
}

impl SchoolEvent {
    /// Creates a new, unpinned event with the identifying fields.
    pub fn new(title: impl Into<String>, start: impl Into<EventTime>, school: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start: start.into(),
            end: None,
            location: None,
            description: None,
            school: school.into(),
            pinned: false,
        }
    }

    /// Builder method to set the end time.
    pub fn with_end(mut self, end: impl Into<EventTime>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the pinned flag.
    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// Marks this event as pinned.
    pub fn set_pinned(&mut self) {
        self.pinned = true;
    }

    /// Returns true if this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    /// The calendar day this event falls on.
    pub fn day(&self) -> NaiveDate {
        self.start.date()
    }

    /// The index key for this event's day.
    pub fn day_key(&self) -> DayKey {
        DayKey::of(self.start)
    }
}

impl PartialEq for SchoolEvent {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.title == other.title && self.school == other.school
    }
}

impl Eq for SchoolEvent {}

impl Hash for SchoolEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.title.hash(state);
        self.school.hash(state);
    }
}
