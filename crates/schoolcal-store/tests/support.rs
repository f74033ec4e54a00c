#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use schoolcal_core::School;
use schoolcal_providers::{
    BoxFuture, CalendarProvider, FetchResult, ProviderError, ProviderResult, RawEvent, RawEventTime,
};
use schoolcal_store::CalendarCache;
use tempfile::TempDir;

/// How the mock answers a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Return the configured feed immediately.
    Immediate,
    /// Sleep before returning the feed.
    Delayed(Duration),
    /// Never complete.
    Hang,
}

/// In-memory provider serving canned feeds and counting fetches.
pub struct MockProvider {
    feeds: HashMap<String, Vec<RawEvent>>,
    failing: Option<String>,
    behavior: Behavior,
    fetches: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            feeds: HashMap::new(),
            failing: None,
            behavior: Behavior::Immediate,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_feed(mut self, school: &str, events: Vec<RawEvent>) -> Self {
        self.feeds.insert(school.to_string(), events);
        self
    }

    pub fn failing_for(mut self, school: &str) -> Self {
        self.failing = Some(school.to_string());
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl CalendarProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch_events<'a>(&'a self, school: &'a School) -> BoxFuture<'a, ProviderResult<FetchResult>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Immediate => {}
                Behavior::Delayed(delay) => tokio::time::sleep(delay).await,
                Behavior::Hang => std::future::pending::<()>().await,
            }

            if self.failing.as_deref() == Some(school.id.as_str()) {
                return Err(ProviderError::http_status(503, "Service Unavailable").with_school(&school.id));
            }

            let events = self.feeds.get(&school.id).cloned().unwrap_or_default();
            Ok(FetchResult::new(&school.id, events))
        })
    }
}

pub fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    may(day).and_hms_opt(hour, 0, 0).unwrap()
}

pub fn school(id: &str) -> School {
    School::parse(id, id.to_uppercase(), format!("https://example.org/{}.ics", id)).unwrap()
}

/// Feed entries for the two-school scenario.
pub fn phs_feed() -> Vec<RawEvent> {
    vec![
        RawEvent::new("fair@phs", RawEventTime::from_local(at(1, 18))).with_summary("Science Fair"),
        RawEvent::new("assembly@phs", RawEventTime::from_local(at(1, 9))).with_summary("Assembly"),
    ]
}

pub fn hhms_feed() -> Vec<RawEvent> {
    vec![
        RawEvent::new("field@hhms", RawEventTime::from_date(may(3))).with_summary("Field Day"),
        RawEvent::new("play@hhms", RawEventTime::from_date(may(4)))
            .with_summary("Spring Play")
            .with_status("Cancelled"),
    ]
}

pub fn district_provider() -> MockProvider {
    MockProvider::new()
        .with_feed("phs", phs_feed())
        .with_feed("hhms", hhms_feed())
}

pub fn new_cache(dir: &TempDir, provider: Arc<MockProvider>) -> CalendarCache {
    CalendarCache::new(provider, vec![school("phs"), school("hhms")], dir.path())
}
