//! CalendarProvider trait definition.
//!
//! A provider is the fetch collaborator of the calendar cache: given a
//! [`School`], it downloads and parses that school's calendar and hands back
//! the raw entries. The cache decides when to call it and what to do with
//! the result.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use schoolcal_core::School;

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawEvent;

/// Entries fetched for one school.
#[derive(Debug)]
pub struct FetchResult {
    /// Id of the school the entries belong to.
    pub school: String,
    /// Parsed feed entries.
    pub events: Vec<RawEvent>,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    /// Creates a fetch result stamped with the current time.
    pub fn new(school: impl Into<String>, events: Vec<RawEvent>) -> Self {
        Self {
            school: school.into(),
            events,
            fetched_at: Utc::now(),
        }
    }

    /// Returns the number of fetched entries.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the feed had no entries.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A boxed future for async trait methods.
///
/// Keeps [`CalendarProvider`] object-safe so the cache can hold a
/// `Arc<dyn CalendarProvider>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of school calendar entries.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; the cache shares them across tasks
/// - `fetch_events` either returns every entry of the feed or an error, never
///   a partial list
/// - Cancelled entries should be filtered out before returning
pub trait CalendarProvider: Send + Sync {
    /// Returns the name of this provider (e.g., "feed").
    fn name(&self) -> &str;

    /// Fetches and parses the calendar of one school.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network errors, bad status codes or
    /// unparseable feeds.
    fn fetch_events<'a>(&'a self, school: &'a School) -> BoxFuture<'a, ProviderResult<FetchResult>>;

    /// How often the refresh scheduler should re-check this provider.
    fn suggested_refresh_interval(&self) -> Duration {
        Duration::from_secs(60 * 60)
    }
}

/// A provider that always returns an error.
///
/// Stands in when the real provider could not be built, so the cache keeps
/// serving persisted events while every refresh reports the failure.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    /// Creates a new error provider.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl CalendarProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_events<'a>(&'a self, school: &'a School) -> BoxFuture<'a, ProviderResult<FetchResult>> {
        let error = ProviderError::new(self.error.code(), self.error.message()).with_school(&school.id);
        Box::pin(async move { Err(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::raw_event::RawEventTime;

    fn school() -> School {
        School::parse("phs", "Pattonville High", "https://example.org/phs.ics").unwrap()
    }

    #[test]
    fn fetch_result_creation() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let result = FetchResult::new("phs", vec![RawEvent::new("a", RawEventTime::from_date(date))]);

        assert_eq!(result.school, "phs");
        assert_eq!(result.len(), 1);
        assert!(!result.is_empty());
    }

    #[tokio::test]
    async fn error_provider_returns_error() {
        let provider = ErrorProvider::new("offline", ProviderError::bad_url("no feed URL"));
        let school = school();

        assert_eq!(provider.name(), "offline");

        let err = provider.fetch_events(&school).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::BadUrl);
        assert_eq!(err.school(), Some("phs"));
    }

    #[test]
    fn default_refresh_interval() {
        let provider = ErrorProvider::new("offline", ProviderError::internal("test"));
        assert_eq!(provider.suggested_refresh_interval(), Duration::from_secs(3600));
    }
}
