//! ICS/iCalendar parsing for school feeds.
//!
//! Turns an RFC 5545 document into [`RawEvent`]s. A document that does not
//! parse at all is an error; individual VEVENTs missing a UID or DTSTART are
//! skipped with a warning.

use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
};
use tracing::{debug, trace, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawEvent, RawEventTime};

/// Parses ICS content and extracts its events.
///
/// # Errors
///
/// Returns [`ProviderError::not_calendar`] if the content is not an
/// iCalendar document.
pub fn parse_ics_content(ics: &str) -> ProviderResult<Vec<RawEvent>> {
    if !ics.trim_start().starts_with("BEGIN:VCALENDAR") {
        return Err(ProviderError::not_calendar(
            "feed does not start with BEGIN:VCALENDAR",
        ));
    }

    let calendar = ics
        .parse::<Calendar>()
        .map_err(|e| ProviderError::not_calendar(format!("failed to parse ICS: {}", e)))?;

    let mut skipped = 0usize;
    let events: Vec<RawEvent> = calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => {
                let parsed = parse_event(event);
                if parsed.is_none() {
                    skipped += 1;
                }
                parsed
            }
            _ => None,
        })
        .collect();

    if skipped > 0 {
        warn!(skipped = skipped, "Skipped VEVENTs without UID or DTSTART");
    }
    debug!(count = events.len(), "Parsed ICS feed");

    Ok(events)
}

/// Parses a single VEVENT component into a RawEvent.
fn parse_event(event: &Event) -> Option<RawEvent> {
    let uid = event.get_uid()?;
    let start = convert_date_time(event.get_start()?);

    let mut raw = RawEvent::new(uid, start);

    if let Some(end) = event.get_end() {
        raw = raw.with_end(convert_date_time(end));
    }
    if let Some(summary) = event.get_summary() {
        raw = raw.with_summary(summary);
    }
    if let Some(description) = event.get_description() {
        raw = raw.with_description(description);
    }
    if let Some(location) = event.get_location() {
        raw = raw.with_location(location);
    }
    if let Some(status) = event.get_status() {
        raw = raw.with_status(format!("{:?}", status));
    }

    trace!(uid = %raw.uid, summary = ?raw.summary, start = ?raw.start, "Parsed VEVENT");

    Some(raw)
}

/// Converts icalendar DatePerhapsTime to RawEventTime.
///
/// TZID-qualified times are taken as district-local wall time; school feeds
/// are published in the district's own zone.
fn convert_date_time(dt: DatePerhapsTime) -> RawEventTime {
    match dt {
        DatePerhapsTime::Date(date) => RawEventTime::from_date(date),
        DatePerhapsTime::DateTime(cdt) => match cdt {
            CalendarDateTime::Utc(dt) => RawEventTime::from_utc(dt),
            CalendarDateTime::Floating(naive) => RawEventTime::from_local(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                trace!(tzid = %tzid, "Treating TZID time as local");
                RawEventTime::from_local(date_time)
            }
        },
    }
}
