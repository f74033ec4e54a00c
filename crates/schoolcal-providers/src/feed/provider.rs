//! School feed provider implementation.

use std::time::Duration;

use schoolcal_core::School;
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarProvider, FetchResult};

use super::client::FeedClient;
use super::config::FeedConfig;
use super::ics::parse_ics_content;

/// Downloads a school's published `.ics` feed and parses it.
pub struct FeedProvider {
    client: FeedClient,
    config: FeedConfig,
}

impl FeedProvider {
    /// Creates a new feed provider with the given configuration.
    pub fn new(config: FeedConfig) -> ProviderResult<Self> {
        let client = FeedClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }
}

impl CalendarProvider for FeedProvider {
    fn name(&self) -> &str {
        "feed"
    }

    fn fetch_events<'a>(&'a self, school: &'a School) -> BoxFuture<'a, ProviderResult<FetchResult>> {
        Box::pin(async move {
            let url = http_url(&school.calendar_url).map_err(|e| e.with_school(&school.id))?;

            debug!(school = %school.id, url = %url, "Fetching feed");

            let body = self
                .client
                .get(&url)
                .await
                .map_err(|e| e.with_school(&school.id))?;
            let events = parse_ics_content(&body).map_err(|e| e.with_school(&school.id))?;

            info!(school = %school.id, count = events.len(), "Fetched feed");

            Ok(FetchResult::new(&school.id, events))
        })
    }

    fn suggested_refresh_interval(&self) -> Duration {
        // District feeds change a few times a week at most.
        Duration::from_secs(6 * 60 * 60)
    }
}

/// Maps a feed URL onto the URL to request. `webcal://` is the
/// subscription alias for HTTPS.
fn http_url(url: &Url) -> ProviderResult<Url> {
    match url.scheme() {
        "http" | "https" => Ok(url.clone()),
        "webcal" | "webcals" => {
            let rest = url.as_str().split_once("://").map(|(_, rest)| rest).unwrap_or_default();
            Url::parse(&format!("https://{}", rest)).map_err(|e| {
                ProviderError::bad_url(format!("Invalid feed URL {}: {}", url, e))
            })
        }
        other => Err(ProviderError::bad_url(format!(
            "Unsupported feed scheme: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    #[test]
    fn provider_creation() {
        let provider = FeedProvider::new(FeedConfig::default()).unwrap();
        assert_eq!(provider.name(), "feed");
        assert!(provider.config().verify_tls);
        assert_eq!(provider.suggested_refresh_interval(), Duration::from_secs(21600));
    }

    #[test]
    fn webcal_maps_to_https() {
        let url = Url::parse("webcal://calendar.example.org/phs/events.ics").unwrap();
        assert_eq!(
            http_url(&url).unwrap().as_str(),
            "https://calendar.example.org/phs/events.ics"
        );

        let https = Url::parse("https://calendar.example.org/phs.ics").unwrap();
        assert_eq!(http_url(&https).unwrap(), https);
    }

    #[test]
    fn unsupported_scheme_rejected() {
        let url = Url::parse("ftp://calendar.example.org/phs.ics").unwrap();
        let err = http_url(&url).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::BadUrl);
    }

    #[tokio::test]
    async fn unsupported_scheme_fails_fetch_with_school() {
        let provider = FeedProvider::new(FeedConfig::default()).unwrap();
        let school = School::parse("phs", "Pattonville High", "file:///tmp/phs.ics").unwrap();

        let err = provider.fetch_events(&school).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::BadUrl);
        assert_eq!(err.school(), Some("phs"));
    }
}
