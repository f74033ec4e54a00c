//! Persistent settings (last refresh timestamp).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Default settings file name inside the data directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Values kept in the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// When the calendar was last refreshed from the feeds.
    pub last_calendar_update: Option<DateTime<Utc>>,
}

/// Key-value settings backed by a JSON file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a settings store at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a settings store named [`SETTINGS_FILE_NAME`] inside `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(SETTINGS_FILE_NAME))
    }

    /// Returns the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings. A missing file yields the defaults.
    pub fn read(&self) -> StoreResult<Settings> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                StoreError::persistence(&self.path, format!("malformed settings: {}", e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(StoreError::persistence(
                &self.path,
                format!("failed to read settings: {}", e),
            )),
        }
    }

    /// Writes the settings, replacing the file atomically.
    pub fn write(&self, settings: &Settings) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::persistence(parent, format!("failed to create data directory: {}", e))
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(settings)?).map_err(|e| {
            StoreError::persistence(&temp_path, format!("failed to write settings: {}", e))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            StoreError::persistence(&self.path, format!("failed to replace settings: {}", e))
        })?;
        Ok(())
    }

    /// Returns the last refresh time.
    ///
    /// An unreadable settings file counts as "never updated".
    pub fn last_calendar_update(&self) -> Option<DateTime<Utc>> {
        match self.read() {
            Ok(settings) => settings.last_calendar_update,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable settings");
                None
            }
        }
    }

    /// Records `at` as the last refresh time.
    pub fn set_last_calendar_update(&self, at: DateTime<Utc>) -> StoreResult<()> {
        let mut settings = self.read().unwrap_or_default();
        settings.last_calendar_update = Some(at);
        self.write(&settings)?;
        debug!(at = %at, "Recorded calendar update");
        Ok(())
    }
}
