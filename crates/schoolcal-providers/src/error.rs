//! Error types for fetching school calendars.
//!
//! A fetch either yields every entry of a school's feed or fails with a
//! [`ProviderError`]. The refresh policy never merges a partial result, so the
//! error only needs enough detail to log and to decide whether the next
//! scheduled check is worth it.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Why a feed could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Connection refused, DNS failure, TLS failure or a dropped body.
    Network,
    /// The fetch took longer than the configured timeout.
    Timeout,
    /// The feed URL answered 404 or 410.
    FeedMissing,
    /// The feed host answered 429.
    RateLimited,
    /// The feed host answered 5xx.
    ServerError,
    /// Any other non-success status (redirect loops, 401, 403, ...).
    Rejected,
    /// The body was not an iCalendar document.
    NotCalendar,
    /// The school's feed URL cannot be requested.
    BadUrl,
    /// The provider itself is broken (e.g. the HTTP client failed to build).
    Internal,
}

impl ProviderErrorCode {
    /// Maps a non-success HTTP status to a code.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 | 410 => Self::FeedMissing,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::Rejected,
        }
    }

    /// Returns true if the next scheduled check may succeed without anyone
    /// fixing the school's feed URL.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns the snake_case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::FeedMissing => "feed_missing",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Rejected => "rejected",
            Self::NotCalendar => "not_calendar",
            Self::BadUrl => "bad_url",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed fetch of one school's feed.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    school: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            school: None,
            source: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Network, message)
    }

    /// The fetch was abandoned after `after`.
    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ProviderErrorCode::Timeout,
            format!("fetch timed out after {}s", after.as_secs()),
        )
    }

    /// The feed host answered with a non-success `status`.
    pub fn http_status(status: u16, reason: &str) -> Self {
        Self::new(
            ProviderErrorCode::from_status(status),
            format!("HTTP {} {}", status, reason),
        )
    }

    pub fn not_calendar(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotCalendar, message)
    }

    pub fn bad_url(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadUrl, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Internal, message)
    }

    /// Tags the error with the id of the school being fetched.
    pub fn with_school(mut self, school: impl Into<String>) -> Self {
        self.school = Some(school.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Id of the school whose feed failed, if tagged.
    pub fn school(&self) -> Option<&str> {
        self.school.as_deref()
    }

    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref school) = self.school {
            write!(f, "[{}] ", school)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
