//! In-memory event store with date indices.
//!
//! The store keeps every known event plus the user's pinned subset. Both lists
//! are mirrored into a day-keyed index holding positions into the list, so a
//! calendar view can ask "what happens on this day" without scanning.
//!
//! Identity is structural: two events with the same start, title and school
//! are the same event (see [`SchoolEvent`]'s `PartialEq`). Structurally equal
//! events always share a day, so duplicate checks only look inside one bucket.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use schoolcal_core::{IntoDay, SchoolEvent};
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};

/// Day-keyed positions into an event list.
type DayIndex = BTreeMap<NaiveDate, Vec<usize>>;

/// All known events and the pinned subset, each with a day index.
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    all_events: Vec<SchoolEvent>,
    all_index: DayIndex,
    pinned_events: Vec<SchoolEvent>,
    pinned_index: DayIndex,
}

impl EventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges events into the store and returns how many were appended.
    ///
    /// For each incoming event, in order:
    /// - if it matches a pinned event it is marked pinned;
    /// - if it arrives already pinned and is not in the pinned list, it is
    ///   added there (restoring pins from the archive);
    /// - unless an equal event is already stored, it is appended.
    ///
    /// Merging the same batch twice appends nothing the second time.
    pub fn merge_events<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = SchoolEvent>,
    {
        let mut added = 0;
        let mut restored = 0;

        for mut event in events {
            if find_in(&self.pinned_events, &self.pinned_index, &event).is_some() {
                event.pinned = true;
            } else if event.pinned {
                push_indexed(&mut self.pinned_events, &mut self.pinned_index, event.clone());
                restored += 1;
            }

            match find_in(&self.all_events, &self.all_index, &event) {
                Some(pos) => {
                    if event.pinned {
                        self.all_events[pos].pinned = true;
                    }
                    trace!(title = %event.title, "Skipping duplicate event");
                }
                None => {
                    push_indexed(&mut self.all_events, &mut self.all_index, event);
                    added += 1;
                }
            }
        }

        debug!(
            added = added,
            restored_pins = restored,
            total = self.all_events.len(),
            "Merged events"
        );
        added
    }

    /// Pins a stored event.
    ///
    /// No-op if no equal event is stored or an equal event is already pinned,
    /// so the pinned list stays a subset of the stored events.
    pub fn pin(&mut self, event: &SchoolEvent) {
        let Some(pos) = find_in(&self.all_events, &self.all_index, event) else {
            trace!(title = %event.title, "Event not stored, not pinning");
            return;
        };
        if find_in(&self.pinned_events, &self.pinned_index, event).is_some() {
            trace!(title = %event.title, "Event already pinned");
            return;
        }

        self.all_events[pos].pinned = true;
        push_indexed(
            &mut self.pinned_events,
            &mut self.pinned_index,
            event.clone().with_pinned(true),
        );
        debug!(title = %event.title, pinned = self.pinned_events.len(), "Pinned event");
    }

    /// Unpins an event. No-op if it is not pinned.
    pub fn unpin(&mut self, event: &SchoolEvent) {
        let Some(pos) = find_in(&self.pinned_events, &self.pinned_index, event) else {
            trace!(title = %event.title, "Event not pinned");
            return;
        };

        self.pinned_events.remove(pos);
        // Positions after `pos` shifted; rebuild rather than patch.
        self.pinned_index = build_index(&self.pinned_events);
        self.set_pinned_flag(event, false);
        debug!(title = %event.title, pinned = self.pinned_events.len(), "Unpinned event");
    }

    /// Returns the position of `event` in the pinned list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event is not pinned.
    pub fn index_of_pinned(&self, event: &SchoolEvent) -> StoreResult<usize> {
        find_in(&self.pinned_events, &self.pinned_index, event)
            .ok_or_else(|| StoreError::not_found(&event.title))
    }

    /// Returns true if an equal event is pinned.
    pub fn is_pinned(&self, event: &SchoolEvent) -> bool {
        find_in(&self.pinned_events, &self.pinned_index, event).is_some()
    }

    /// Events falling on the day of `date`, in insertion order.
    pub fn events_on_date(&self, date: impl IntoDay) -> Vec<&SchoolEvent> {
        bucket(&self.all_events, &self.all_index, date.day())
    }

    /// Pinned events falling on the day of `date`, in pin order.
    pub fn pinned_on_date(&self, date: impl IntoDay) -> Vec<&SchoolEvent> {
        bucket(&self.pinned_events, &self.pinned_index, date.day())
    }

    /// Returns true if any event falls on the day of `date`.
    pub fn has_events(&self, date: impl IntoDay) -> bool {
        self.all_index.contains_key(&date.day())
    }

    /// Days with at least one event, ascending.
    pub fn days_with_events(&self) -> Vec<NaiveDate> {
        self.all_index.keys().copied().collect()
    }

    /// Drops every event. The pinned list is kept.
    pub fn reset(&mut self) {
        let dropped = self.all_events.len();
        self.all_events.clear();
        self.all_index.clear();
        debug!(dropped = dropped, "Reset event store");
    }

    /// All events in insertion order.
    pub fn all_events(&self) -> &[SchoolEvent] {
        &self.all_events
    }

    /// Pinned events in pin order.
    pub fn pinned_events(&self) -> &[SchoolEvent] {
        &self.pinned_events
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.all_events.len()
    }

    /// Returns true if no events are stored.
    pub fn is_empty(&self) -> bool {
        self.all_events.is_empty()
    }

    fn set_pinned_flag(&mut self, event: &SchoolEvent, pinned: bool) {
        if let Some(pos) = find_in(&self.all_events, &self.all_index, event) {
            self.all_events[pos].pinned = pinned;
        }
    }
}

fn find_in(list: &[SchoolEvent], index: &DayIndex, event: &SchoolEvent) -> Option<usize> {
    index
        .get(&event.day())?
        .iter()
        .copied()
        .find(|&pos| list[pos] == *event)
}

fn push_indexed(list: &mut Vec<SchoolEvent>, index: &mut DayIndex, event: SchoolEvent) {
    index.entry(event.day()).or_default().push(list.len());
    list.push(event);
}

fn build_index(list: &[SchoolEvent]) -> DayIndex {
    let mut index = DayIndex::new();
    for (pos, event) in list.iter().enumerate() {
        index.entry(event.day()).or_default().push(pos);
    }
    index
}

fn bucket<'a>(list: &'a [SchoolEvent], index: &DayIndex, day: NaiveDate) -> Vec<&'a SchoolEvent> {
    index
        .get(&day)
        .map(|positions| positions.iter().map(|&pos| &list[pos]).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn may(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        may(day).and_hms_opt(hour, 0, 0).unwrap()
    }

    fn science_fair() -> SchoolEvent {
        SchoolEvent::new("Science Fair", at(1, 18), "phs")
    }

    fn assembly() -> SchoolEvent {
        SchoolEvent::new("Assembly", at(1, 9), "phs")
    }

    fn field_day() -> SchoolEvent {
        SchoolEvent::new("Field Day", may(3), "hhms")
    }

    fn seeded() -> EventStore {
        let mut store = EventStore::new();
        store.merge_events(vec![science_fair(), assembly(), field_day()]);
        store
    }

    fn assert_indices_consistent(store: &EventStore) {
        for (list, index) in [
            (&store.all_events, &store.all_index),
            (&store.pinned_events, &store.pinned_index),
        ] {
            assert_eq!(*index, build_index(list));
            assert!(index.values().all(|positions| !positions.is_empty()));
        }
    }

    mod merge {
        use super::*;

        #[test]
        fn groups_by_day_in_insertion_order() {
            let store = seeded();

            let first = store.events_on_date(may(1));
            assert_eq!(first, vec![&science_fair(), &assembly()]);
            assert_eq!(first[0].title, "Science Fair");
            assert!(store.events_on_date(may(2)).is_empty());
            assert!(store.has_events(may(3)));
            assert!(!store.has_events(may(2)));
            assert_indices_consistent(&store);
        }

        #[test]
        fn is_idempotent() {
            let mut store = seeded();
            let added = store.merge_events(vec![science_fair(), assembly(), field_day()]);

            assert_eq!(added, 0);
            assert_eq!(store.len(), 3);
        }

        #[test]
        fn dedups_within_one_batch() {
            let mut store = EventStore::new();
            let added = store.merge_events(vec![
                science_fair(),
                science_fair().with_location("Gym"),
                field_day(),
            ]);

            assert_eq!(added, 2);
            assert_eq!(store.all_events()[0].location, None);
        }

        #[test]
        fn same_title_different_school_is_distinct() {
            let mut store = seeded();
            let added = store.merge_events(vec![SchoolEvent::new("Science Fair", at(1, 18), "hhms")]);

            assert_eq!(added, 1);
            assert_eq!(store.events_on_date(may(1)).len(), 3);
        }

        #[test]
        fn marks_incoming_copy_of_pinned_event() {
            let mut store = seeded();
            store.pin(&science_fair());
            store.reset();
            store.merge_events(vec![science_fair()]);

            let stored = store.events_on_date(may(1));
            assert!(stored[0].pinned);
        }

        #[test]
        fn restores_pins_from_flagged_events() {
            let mut store = EventStore::new();
            store.merge_events(vec![science_fair().with_pinned(true), assembly()]);

            assert_eq!(store.pinned_events().len(), 1);
            assert_eq!(store.index_of_pinned(&science_fair()).unwrap(), 0);
            assert_eq!(store.pinned_on_date(may(1)), vec![&science_fair()]);
            assert_indices_consistent(&store);
        }

        #[test]
        fn accepts_any_day_like_query() {
            let store = seeded();
            assert_eq!(store.events_on_date(at(1, 23)).len(), 2);
            assert_eq!(store.events_on_date(schoolcal_core::DayKey::of(may(3))).len(), 1);
            assert_eq!(store.days_with_events(), vec![may(1), may(3)]);
        }
    }

    mod pinning {
        use super::*;

        #[test]
        fn pin_then_index() {
            let mut store = seeded();
            store.pin(&science_fair());

            assert_eq!(store.index_of_pinned(&science_fair()).unwrap(), 0);
            assert!(store.is_pinned(&science_fair()));
            assert!(store.all_events()[0].pinned);
            assert!(store.pinned_events()[0].pinned);
        }

        #[test]
        fn pin_unknown_event_is_noop() {
            let mut store = EventStore::new();
            store.merge_events(vec![assembly()]);
            store.pin(&SchoolEvent::new("Ghost", at(1, 12), "phs"));

            assert!(store.pinned_events().is_empty());
            assert!(store.pinned_on_date(may(1)).is_empty());
            assert!(store.index_of_pinned(&assembly()).unwrap_err().is_not_found());
            assert!(!store.all_events()[0].pinned);
            assert_indices_consistent(&store);
        }

        #[test]
        fn pin_twice_is_noop() {
            let mut store = seeded();
            store.pin(&science_fair());
            store.pin(&science_fair());

            assert_eq!(store.pinned_events().len(), 1);
            assert_indices_consistent(&store);
        }

        #[test]
        fn unpin_not_pinned_is_noop() {
            let mut store = seeded();
            store.pin(&science_fair());
            store.unpin(&assembly());

            assert_eq!(store.pinned_events(), &[science_fair()]);
            assert_eq!(store.index_of_pinned(&science_fair()).unwrap(), 0);
        }

        #[test]
        fn pin_unpin_restores_pinned_list() {
            let mut store = seeded();
            store.pin(&field_day());
            let before = store.pinned_events().to_vec();

            store.pin(&science_fair());
            store.unpin(&science_fair());

            assert_eq!(store.pinned_events(), before.as_slice());
            assert!(!store.all_events()[0].pinned);
            assert!(store.pinned_on_date(may(1)).is_empty());
            assert_indices_consistent(&store);
        }

        #[test]
        fn unpin_shifts_remaining_positions() {
            let mut store = seeded();
            store.pin(&science_fair());
            store.pin(&assembly());
            store.pin(&field_day());

            store.unpin(&science_fair());

            assert_eq!(store.index_of_pinned(&assembly()).unwrap(), 0);
            assert_eq!(store.index_of_pinned(&field_day()).unwrap(), 1);
            assert_indices_consistent(&store);
        }

        #[test]
        fn index_of_missing_is_not_found() {
            let store = seeded();
            let err = store.index_of_pinned(&assembly()).unwrap_err();
            assert!(err.is_not_found());
        }
    }

    mod reset {
        use super::*;

        #[test]
        fn clears_events_but_keeps_pins() {
            let mut store = seeded();
            store.pin(&field_day());
            store.reset();

            assert!(store.is_empty());
            assert!(store.days_with_events().is_empty());
            assert!(!store.has_events(may(3)));
            assert_eq!(store.pinned_events().len(), 1);
            assert_eq!(store.pinned_on_date(may(3)).len(), 1);
        }
    }
}
