//! Event store, persistence and refresh policy for the district calendar.
//!
//! This crate provides:
//! - [`EventStore`]: all events and pinned events, each indexed by day
//! - [`EventArchive`] / [`SettingsStore`]: the on-disk archive and the
//!   last-update timestamp
//! - [`CalendarCache`]: the shared cache tying both to a
//!   [`CalendarProvider`](schoolcal_providers::CalendarProvider) with a
//!   one-week staleness policy
//! - [`RefreshScheduler`]: periodic background freshness checks
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use schoolcal_providers::feed::{FeedConfig, FeedProvider};
//! use schoolcal_store::{CacheConfig, CalendarCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     schoolcal_core::init_tracing(tracing::Level::INFO, schoolcal_core::LogFormat::Text)?;
//!     let config = CacheConfig::load()?;
//!     let provider = FeedProvider::new(FeedConfig::default().with_timeout(config.fetch_timeout()))?;
//!     let cache = Arc::new(CalendarCache::from_config(&config, Arc::new(provider)));
//!
//!     cache.ensure_fresh_then(|outcome| println!("{:?}", outcome)).await;
//!     let today = chrono::Local::now().date_naive();
//!     for event in cache.events_on_date(today).await {
//!         println!("{}", event.title);
//!     }
//!     Ok(())
//! }
//! ```

mod archive;
mod cache;
mod config;
mod error;
mod refresh;
mod scheduler;
mod settings;
mod store;

pub use archive::{ARCHIVE_FILE_NAME, ARCHIVE_VERSION, EventArchive};
pub use cache::CalendarCache;
pub use config::CacheConfig;
pub use error::{StoreError, StoreResult};
pub use refresh::{RefreshCancel, RefreshOutcome, RefreshPhase, StalenessPolicy};
pub use scheduler::{
    RefreshScheduler, RefreshTrigger, SchedulerCommand, SchedulerConfig, SchedulerHandle,
    SchedulerState, SharedSchedulerState, new_scheduler_state,
};
pub use settings::{SETTINGS_FILE_NAME, Settings, SettingsStore};
pub use store::EventStore;
