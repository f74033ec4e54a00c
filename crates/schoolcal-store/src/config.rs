//! Cache configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/schoolcal/config.toml` by default:
//!
//! ```toml
//! data_dir = "/var/lib/schoolcal"
//! max_age_days = 7
//! check_interval_secs = 3600
//! fetch_timeout_secs = 30
//!
//! [[schools]]
//! id = "phs"
//! name = "Pattonville High School"
//! calendar_url = "https://example.org/phs.ics"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use schoolcal_core::School;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::refresh::StalenessPolicy;

/// Configuration for the calendar cache and its refresh scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the event archive and settings file.
    pub data_dir: PathBuf,

    /// Cached data older than this many days is refetched.
    pub max_age_days: u64,

    /// How often the scheduler re-checks staleness.
    pub check_interval_secs: u64,

    /// Per-school fetch timeout.
    pub fetch_timeout_secs: u64,

    /// Schools whose feeds are merged into the cache.
    pub schools: Vec<School>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            max_age_days: 7,
            check_interval_secs: 60 * 60,
            fetch_timeout_secs: 30,
            schools: Vec::new(),
        }
    }
}

impl CacheConfig {
    /// Creates a configuration storing its files in `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Builder: set max age in days.
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    /// Builder: set check interval.
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval_secs = interval.as_secs();
        self
    }

    /// Builder: set fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = timeout.as_secs();
        self
    }

    /// Builder: add a school.
    pub fn with_school(mut self, school: School) -> Self {
        self.schools.push(school);
        self
    }

    /// Returns the staleness policy for `max_age_days`.
    pub fn staleness_policy(&self) -> StalenessPolicy {
        StalenessPolicy::days(self.max_age_days)
    }

    /// Returns the check interval.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Returns the fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Loads configuration from the default path, falling back to defaults
    /// if the file does not exist.
    pub fn load() -> StoreResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::config(format!("failed to read config: {}", e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| StoreError::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Largest accepted `max_age_days`, one hundred years.
    pub const MAX_AGE_DAYS_LIMIT: u64 = 36_500;

    /// Checks values that would make the cache misbehave.
    pub fn validate(&self) -> StoreResult<()> {
        if self.max_age_days > Self::MAX_AGE_DAYS_LIMIT {
            return Err(StoreError::config(format!(
                "max_age_days must be at most {}",
                Self::MAX_AGE_DAYS_LIMIT
            )));
        }
        if self.check_interval_secs == 0 {
            return Err(StoreError::config("check_interval_secs must be positive"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(StoreError::config("fetch_timeout_secs must be positive"));
        }

        let mut seen = std::collections::HashSet::new();
        for school in &self.schools {
            if !seen.insert(school.id.as_str()) {
                return Err(StoreError::config(format!(
                    "duplicate school id: {}",
                    school.id
                )));
            }
        }
        Ok(())
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("schoolcal")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("schoolcal")
    }
}
