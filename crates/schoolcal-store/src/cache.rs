//! The calendar cache: event store, persistence and refresh policy.
//!
//! [`CalendarCache`] owns an [`EventStore`] behind a tokio `RwLock` and ties
//! it to the archive file, the settings file and a [`CalendarProvider`].
//! It is meant to be shared as `Arc<CalendarCache>`.
//!
//! Only one refresh cycle runs at a time. The fetch happens without holding
//! the store lock; the merge happens in a single write section once every
//! school has been fetched, so readers never see a partial refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use schoolcal_core::{IntoDay, School, SchoolEvent};
use schoolcal_providers::{CalendarProvider, ProviderError, normalize_events};
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::archive::EventArchive;
use crate::config::CacheConfig;
use crate::error::{StoreError, StoreResult};
use crate::refresh::{RefreshCancel, RefreshOutcome, RefreshPhase, StalenessPolicy};
use crate::settings::SettingsStore;
use crate::store::EventStore;

/// Shared calendar cache.
pub struct CalendarCache {
    store: RwLock<EventStore>,
    archive: EventArchive,
    settings: SettingsStore,
    policy: StalenessPolicy,
    provider: Arc<dyn CalendarProvider>,
    schools: Vec<School>,
    fetch_timeout: Duration,
    refresh_guard: Mutex<()>,
    save_guard: Mutex<()>,
    cancel: RefreshCancel,
    phase: watch::Sender<RefreshPhase>,
}

impl CalendarCache {
    /// Default per-school fetch timeout.
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a cache keeping its files in `data_dir`.
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        schools: Vec<School>,
        data_dir: impl AsRef<std::path::Path>,
    ) -> Self {
        let (phase, _) = watch::channel(RefreshPhase::Idle);
        Self {
            store: RwLock::new(EventStore::new()),
            archive: EventArchive::in_dir(data_dir.as_ref()),
            settings: SettingsStore::in_dir(data_dir.as_ref()),
            policy: StalenessPolicy::default(),
            provider,
            schools,
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
            refresh_guard: Mutex::new(()),
            save_guard: Mutex::new(()),
            cancel: RefreshCancel::new(),
            phase,
        }
    }

    /// Creates a cache from a loaded configuration.
    pub fn from_config(config: &CacheConfig, provider: Arc<dyn CalendarProvider>) -> Self {
        Self::new(provider, config.schools.clone(), &config.data_dir)
            .with_policy(config.staleness_policy())
            .with_fetch_timeout(config.fetch_timeout())
    }

    /// Builder: set the staleness policy.
    pub fn with_policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder: set the per-school fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Builder: replace the archive location.
    pub fn with_archive(mut self, archive: EventArchive) -> Self {
        self.archive = archive;
        self
    }

    /// Returns the configured schools.
    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    /// Returns the archive.
    pub fn archive(&self) -> &EventArchive {
        &self.archive
    }

    /// Returns the settings store.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Returns the staleness policy.
    pub fn policy(&self) -> StalenessPolicy {
        self.policy
    }

    // ---------------------------------------------------------------------
    // Store access
    // ---------------------------------------------------------------------

    /// Read access to the store for queries that borrow events.
    pub async fn store(&self) -> RwLockReadGuard<'_, EventStore> {
        self.store.read().await
    }

    /// Merges events into the store. See [`EventStore::merge_events`].
    pub async fn merge_events(&self, events: Vec<SchoolEvent>) -> usize {
        self.store.write().await.merge_events(events)
    }

    /// Pins an event.
    pub async fn pin(&self, event: &SchoolEvent) {
        self.store.write().await.pin(event);
    }

    /// Unpins an event.
    pub async fn unpin(&self, event: &SchoolEvent) {
        self.store.write().await.unpin(event);
    }

    /// Position of `event` in the pinned list.
    pub async fn index_of_pinned(&self, event: &SchoolEvent) -> StoreResult<usize> {
        self.store.read().await.index_of_pinned(event)
    }

    /// Events on the day of `date`, cloned out of the store.
    pub async fn events_on_date(&self, date: impl IntoDay) -> Vec<SchoolEvent> {
        self.store
            .read()
            .await
            .events_on_date(date)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Returns true if any event falls on the day of `date`.
    pub async fn has_events(&self, date: impl IntoDay) -> bool {
        self.store.read().await.has_events(date)
    }

    /// Days with at least one event.
    pub async fn days_with_events(&self) -> Vec<NaiveDate> {
        self.store.read().await.days_with_events()
    }

    /// Pinned events, in pin order.
    pub async fn pinned_events(&self) -> Vec<SchoolEvent> {
        self.store.read().await.pinned_events().to_vec()
    }

    /// Drops every event, keeping pins.
    pub async fn reset(&self) {
        self.store.write().await.reset();
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Writes every event to the archive. Returns false on failure.
    ///
    /// Overlapping saves run one after the other, each writing the store as
    /// it was when that save got its turn.
    pub async fn save(&self) -> bool {
        let _guard = self.save_guard.lock().await;
        let snapshot = self.store.read().await.all_events().to_vec();
        match self.archive.write(&snapshot) {
            Ok(()) => {
                info!(count = snapshot.len(), path = %self.archive.path().display(), "Saved events");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to save events");
                false
            }
        }
    }

    /// Reads the archive into the store.
    ///
    /// Returns true whenever the archive was read. The archived events are
    /// only applied if the store is empty; otherwise they are discarded.
    pub async fn load(&self) -> bool {
        let events = match self.archive.read() {
            Ok(Some(events)) => events,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Failed to load events");
                return false;
            }
        };

        let mut store = self.store.write().await;
        if store.is_empty() {
            let added = store.merge_events(events);
            info!(count = added, "Loaded events from archive");
        } else {
            debug!(
                archived = events.len(),
                in_memory = store.len(),
                "Store not empty, discarding archived events"
            );
        }
        true
    }

    // ---------------------------------------------------------------------
    // Refresh
    // ---------------------------------------------------------------------

    /// Returns the current refresh phase.
    pub fn phase(&self) -> RefreshPhase {
        *self.phase.borrow()
    }

    /// Subscribes to refresh phase changes.
    pub fn watch_phase(&self) -> watch::Receiver<RefreshPhase> {
        self.phase.subscribe()
    }

    /// Returns a handle that cancels the fetch of an in-flight refresh.
    pub fn cancel_handle(&self) -> RefreshCancel {
        self.cancel.clone()
    }

    /// Refreshes from the feeds if the cached data is stale, missing or empty.
    ///
    /// Loads the archive first, so a cold start serves persisted events
    /// without fetching when they are recent enough. Calls are serialized: a
    /// caller that waited for another refresh re-checks and usually finds the
    /// data fresh.
    pub async fn ensure_fresh(&self) -> RefreshOutcome {
        let _guard = self.refresh_guard.lock().await;

        let loaded = self.load().await;
        let last_update = self.settings.last_calendar_update();
        let stale = self.policy.is_stale(last_update, Utc::now());
        let empty = self.store.read().await.is_empty();

        if !stale && loaded && !empty {
            debug!(last_update = ?last_update, "Calendar is fresh");
            return RefreshOutcome::Fresh;
        }

        info!(stale = stale, loaded = loaded, empty = empty, "Refreshing calendar");
        self.refresh_locked().await
    }

    /// Runs [`ensure_fresh`](Self::ensure_fresh) and hands the outcome to
    /// `completion`, which is called exactly once on every path.
    pub async fn ensure_fresh_then<F>(&self, completion: F)
    where
        F: FnOnce(RefreshOutcome),
    {
        let outcome = self.ensure_fresh().await;
        completion(outcome);
    }

    /// Spawns [`ensure_fresh_then`](Self::ensure_fresh_then) on the runtime.
    pub fn ensure_fresh_in_background<F>(self: &Arc<Self>, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(RefreshOutcome) + Send + 'static,
    {
        let cache = Arc::clone(self);
        tokio::spawn(async move { cache.ensure_fresh_then(completion).await })
    }

    /// Refreshes from the feeds regardless of staleness.
    ///
    /// The archive is still loaded first so that pins survive a forced
    /// refresh on a cold start.
    pub async fn refresh(&self) -> RefreshOutcome {
        let _guard = self.refresh_guard.lock().await;
        self.load().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> RefreshOutcome {
        let mut cancelled = self.cancel.subscribe();

        self.set_phase(RefreshPhase::Fetching);
        let fetched = tokio::select! {
            biased;
            _ = cancelled.changed() => None,
            result = self.fetch_all() => Some(result),
        };

        let events = match fetched {
            None => {
                info!("Refresh cancelled");
                self.set_phase(RefreshPhase::Idle);
                return RefreshOutcome::Cancelled;
            }
            Some(Err(e)) => {
                warn!(error = %e, "Refresh failed, keeping cached events");
                self.set_phase(RefreshPhase::Idle);
                return RefreshOutcome::Failed(e.to_string());
            }
            Some(Ok(events)) => events,
        };

        self.set_phase(RefreshPhase::Merging);
        let added = self.store.write().await.merge_events(events);

        self.set_phase(RefreshPhase::Saving);
        let saved = self.save().await;

        if saved {
            self.set_phase(RefreshPhase::UpdatingTimestamp);
            if let Err(e) = self.settings.set_last_calendar_update(Utc::now()) {
                warn!(error = %e, "Failed to record calendar update");
            }
        }

        self.set_phase(RefreshPhase::Idle);
        info!(added = added, saved = saved, "Refresh complete");
        RefreshOutcome::Refreshed { added, saved }
    }

    /// Fetches and normalizes every school. Any failure fails the whole batch.
    async fn fetch_all(&self) -> StoreResult<Vec<SchoolEvent>> {
        if self.schools.is_empty() {
            return Err(StoreError::config("no schools configured"));
        }

        let mut events = Vec::new();
        for school in &self.schools {
            let result = tokio::time::timeout(self.fetch_timeout, self.provider.fetch_events(school))
                .await
                .map_err(|_| ProviderError::timeout(self.fetch_timeout).with_school(&school.id))??;

            let normalized = normalize_events(&result.events, &school.id, &Local);
            debug!(
                school = %school.id,
                provider = self.provider.name(),
                fetched = result.len(),
                kept = normalized.len(),
                "Fetched school calendar"
            );
            events.extend(normalized);
        }
        Ok(events)
    }

    fn set_phase(&self, phase: RefreshPhase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            debug!(from = %previous, to = %phase, "Refresh phase");
        }
    }
}

impl std::fmt::Debug for CalendarCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarCache")
            .field("archive", &self.archive)
            .field("settings", &self.settings)
            .field("policy", &self.policy)
            .field("provider", &self.provider.name())
            .field("schools", &self.schools.len())
            .field("phase", &self.phase())
            .finish()
    }
}
