//! On-disk archive of the event list.
//!
//! The archive is a single JSON file holding every event (pinned flags
//! included) inside a small versioned envelope. Writes go to a sibling temp
//! file which is then renamed over the archive, so a crash mid-write leaves
//! the previous archive intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use schoolcal_core::SchoolEvent;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Default archive file name inside the data directory.
pub const ARCHIVE_FILE_NAME: &str = "event.archive.json";

/// Current envelope version.
pub const ARCHIVE_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    events: &'a [SchoolEvent],
}

#[derive(Debug, Deserialize)]
struct Envelope {
    version: u32,
    #[allow(dead_code)]
    saved_at: Option<DateTime<Utc>>,
    events: Vec<SchoolEvent>,
}

/// Reads and writes the event archive at a fixed path.
#[derive(Debug, Clone)]
pub struct EventArchive {
    path: PathBuf,
}

impl EventArchive {
    /// Creates an archive at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates an archive named [`ARCHIVE_FILE_NAME`] inside `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(ARCHIVE_FILE_NAME))
    }

    /// Returns the archive path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the archive file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Writes `events` to the archive, replacing any previous content.
    pub fn write(&self, events: &[SchoolEvent]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::persistence(parent, format!("failed to create data directory: {}", e))
            })?;
        }

        let envelope = EnvelopeRef {
            version: ARCHIVE_VERSION,
            saved_at: Utc::now(),
            events,
        };
        let content = serde_json::to_string(&envelope)?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| {
            StoreError::persistence(&temp_path, format!("failed to write archive: {}", e))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            StoreError::persistence(&self.path, format!("failed to replace archive: {}", e))
        })?;

        debug!(path = %self.path.display(), count = events.len(), "Wrote event archive");
        Ok(())
    }

    /// Reads the archive. A missing file yields `Ok(None)`.
    pub fn read(&self) -> StoreResult<Option<Vec<SchoolEvent>>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No event archive");
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::persistence(
                    &self.path,
                    format!("failed to read archive: {}", e),
                ));
            }
        };

        let envelope: Envelope = serde_json::from_str(&content).map_err(|e| {
            StoreError::persistence(&self.path, format!("malformed archive: {}", e))
        })?;

        if envelope.version > ARCHIVE_VERSION {
            return Err(StoreError::persistence(
                &self.path,
                format!("unsupported archive version {}", envelope.version),
            ));
        }

        debug!(
            path = %self.path.display(),
            count = envelope.events.len(),
            "Read event archive"
        );
        Ok(Some(envelope.events))
    }

    /// Deletes the archive file if present.
    pub fn remove(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
