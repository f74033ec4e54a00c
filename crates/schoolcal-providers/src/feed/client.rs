//! HTTP client for downloading iCalendar feeds.

use reqwest::{Client, Response};
use tracing::{trace, warn};
use url::Url;

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};

use super::config::FeedConfig;

/// Thin wrapper over a reqwest client that maps HTTP failures to
/// [`ProviderError`] codes.
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &FeedConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("Failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client })
    }

    /// Downloads the body at `url` as text.
    pub async fn get(&self, url: &Url) -> ProviderResult<String> {
        trace!(url = %url, "Sending request");

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/calendar, */*;q=0.5")
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Request failed: {}", e)).with_source(e))?;

        handle_response(response).await
    }
}

/// Handles the HTTP response and extracts the body.
async fn handle_response(response: Response) -> ProviderResult<String> {
    let status = response.status();
    trace!(status = %status, "Received response");

    if status.is_success() {
        return response.text().await.map_err(|e| {
            ProviderError::network(format!("Failed to read response: {}", e)).with_source(e)
        });
    }

    let error = ProviderError::http_status(
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status"),
    );
    if error.code() == ProviderErrorCode::Rejected {
        warn!(status = %status, "Unexpected response status");
    }
    Err(error)
}
