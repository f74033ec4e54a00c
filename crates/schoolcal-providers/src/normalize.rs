//! RawEvent to SchoolEvent conversion.
//!
//! The store indexes entries by the calendar day they fall on in the
//! district, so every time is reduced to local wall-clock time here.
//! UTC instants are shifted into the supplied zone; floating and
//! TZID-qualified times are already local.

use chrono::TimeZone;
use schoolcal_core::{EventTime, SchoolEvent};
use tracing::trace;

use crate::raw_event::{RawEvent, RawEventTime};

/// Converts a [`RawEvent`] into a [`SchoolEvent`] owned by `school`.
pub fn normalize_event<Tz: TimeZone>(raw: &RawEvent, school: &str, tz: &Tz) -> SchoolEvent {
    let mut event = SchoolEvent::new(raw.effective_title(), convert_time(&raw.start, tz), school);

    if let Some(ref end) = raw.end {
        event = event.with_end(convert_time(end, tz));
    }
    if let Some(location) = non_blank(raw.location.as_deref()) {
        event = event.with_location(location);
    }
    if let Some(description) = non_blank(raw.description.as_deref()) {
        event = event.with_description(description);
    }

    event
}

/// Normalizes a batch, dropping entries the feed marks as cancelled.
pub fn normalize_events<Tz: TimeZone>(raws: &[RawEvent], school: &str, tz: &Tz) -> Vec<SchoolEvent> {
    raws.iter()
        .filter(|raw| {
            let keep = !raw.is_cancelled();
            if !keep {
                trace!(uid = %raw.uid, "Dropping cancelled entry");
            }
            keep
        })
        .map(|raw| normalize_event(raw, school, tz))
        .collect()
}

fn convert_time<Tz: TimeZone>(raw: &RawEventTime, tz: &Tz) -> EventTime {
    match raw {
        RawEventTime::Utc(dt) => EventTime::from_utc_in(*dt, tz),
        RawEventTime::Local(dt) => EventTime::from_local(*dt),
        RawEventTime::Date(date) => EventTime::from_date(*date),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};

    fn central() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn may(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn utc_evening_lands_on_local_day() {
        // 02:00Z on the 3rd is 21:00 on the 2nd, five hours west.
        let start = Utc.from_utc_datetime(&may(3).and_hms_opt(2, 0, 0).unwrap());
        let raw = RawEvent::new("board", RawEventTime::from_utc(start)).with_summary("Board Meeting");

        let event = normalize_event(&raw, "district", &central());

        assert_eq!(event.day(), may(2));
        assert_eq!(event.start.as_datetime(), Some(&may(2).and_hms_opt(21, 0, 0).unwrap()));
        assert_eq!(event.school, "district");
    }

    #[test]
    fn all_day_and_local_pass_through() {
        let raw = RawEvent::new("field", RawEventTime::from_date(may(3)))
            .with_summary("Field Day")
            .with_end(RawEventTime::from_date(may(4)))
            .with_location("  ")
            .with_description("Bring water");

        let event = normalize_event(&raw, "phs", &central());

        assert!(event.is_all_day());
        assert_eq!(event.day(), may(3));
        assert_eq!(event.end, Some(EventTime::from_date(may(4))));
        assert!(event.location.is_none());
        assert_eq!(event.description.as_deref(), Some("Bring water"));
    }

    #[test]
    fn normalize_events_drops_cancelled() {
        let raws = vec![
            RawEvent::new("a", RawEventTime::from_date(may(1))).with_summary("Picture Day"),
            RawEvent::new("b", RawEventTime::from_date(may(2)))
                .with_summary("Assembly")
                .with_status("Cancelled"),
        ];

        let events = normalize_events(&raws, "hhms", &central());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Picture Day");
    }
}
