//! Store error types.

use std::io;
use std::path::Path;

use schoolcal_providers::ProviderError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the event store and its persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The event is not in the pinned list.
    #[error("Event not found: {title}")]
    NotFound { title: String },

    /// Archive or settings file could not be read or written.
    #[error("Persistence error at {path}: {message}")]
    Persistence { path: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Fetching a school feed failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] ProviderError),
}

impl StoreError {
    /// Creates a not found error for the event with the given title.
    pub fn not_found(title: impl Into<String>) -> Self {
        Self::NotFound {
            title: title.into(),
        }
    }

    /// Creates a persistence error for the given path.
    pub fn persistence(path: &Path, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this is a [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
