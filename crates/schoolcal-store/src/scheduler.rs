//! Background scheduler for calendar refreshes.
//!
//! The scheduler wakes up on a fixed check interval and asks the cache to
//! ensure its data is fresh; most wake-ups find it fresh and fetch nothing.
//! A `RefreshNow` command forces a fetch regardless of staleness. There is no
//! retry or backoff: a failed refresh waits for the next trigger.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::cache::CalendarCache;
use crate::refresh::RefreshOutcome;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between staleness checks.
    pub check_interval: Duration,
    /// Whether to check once immediately on start.
    pub check_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60 * 60),
            check_on_start: true,
        }
    }
}

impl SchedulerConfig {
    /// Creates a new scheduler config with the given check interval.
    pub fn new(check_interval: Duration) -> Self {
        Self {
            check_interval,
            ..Default::default()
        }
    }

    /// Builder: set whether to check on start.
    pub fn with_check_on_start(mut self, check_on_start: bool) -> Self {
        self.check_on_start = check_on_start;
        self
    }
}

/// Why a refresh was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Periodic check; only refetch if stale.
    Scheduled,
    /// Explicit request; refetch now.
    Manual,
}

/// Commands that can be sent to the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// Force an immediate refresh.
    RefreshNow,
    /// Stop the scheduler.
    Stop,
}

/// Scheduler state.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Number of triggers handled.
    pub checks: u64,
    /// Number of consecutive failed refreshes.
    pub consecutive_failures: u32,
    /// Last time new data was merged.
    pub last_refresh: Option<DateTime<Utc>>,
    /// Last time a trigger was handled.
    pub last_check: Option<DateTime<Utc>>,
    /// Outcome of the last trigger.
    pub last_outcome: Option<RefreshOutcome>,
}

impl SchedulerState {
    /// Creates a new scheduler state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a trigger.
    pub fn record(&mut self, outcome: RefreshOutcome) {
        let now = Utc::now();
        self.checks += 1;
        self.last_check = Some(now);
        match outcome {
            RefreshOutcome::Refreshed { .. } => {
                self.consecutive_failures = 0;
                self.last_refresh = Some(now);
            }
            RefreshOutcome::Failed(_) => self.consecutive_failures += 1,
            RefreshOutcome::Fresh | RefreshOutcome::Cancelled => {}
        }
        self.last_outcome = Some(outcome);
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Creates a new shared scheduler state.
pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::new()))
}

/// Runs periodic refresh checks.
pub struct RefreshScheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl RefreshScheduler {
    /// Creates a new scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the scheduler loop against a calendar cache.
    ///
    /// Scheduled checks call [`CalendarCache::ensure_fresh`]; `RefreshNow`
    /// calls [`CalendarCache::refresh`].
    pub async fn run_with_cache(self, cache: Arc<CalendarCache>) {
        self.run(move |trigger| {
            let cache = Arc::clone(&cache);
            async move {
                match trigger {
                    RefreshTrigger::Scheduled => cache.ensure_fresh().await,
                    RefreshTrigger::Manual => cache.refresh().await,
                }
            }
        })
        .await;
    }

    /// Runs the scheduler loop with the given refresh function.
    pub async fn run<F, Fut>(self, refresh_fn: F)
    where
        F: Fn(RefreshTrigger) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RefreshOutcome> + Send,
    {
        let Self {
            config,
            state,
            command_tx,
            mut command_rx,
        } = self;
        // Only handles may keep the channel open.
        drop(command_tx);

        info!(
            interval_secs = config.check_interval.as_secs(),
            "Scheduler started"
        );

        if config.check_on_start {
            do_refresh(&state, &refresh_fn, RefreshTrigger::Scheduled).await;
        }

        loop {
            debug!(delay_secs = config.check_interval.as_secs(), "Scheduling next check");

            tokio::select! {
                _ = tokio::time::sleep(config.check_interval) => {
                    do_refresh(&state, &refresh_fn, RefreshTrigger::Scheduled).await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::RefreshNow) => {
                            debug!("Received RefreshNow command");
                            do_refresh(&state, &refresh_fn, RefreshTrigger::Manual).await;
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("Scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}

async fn do_refresh<F, Fut>(state: &SharedSchedulerState, refresh_fn: &F, trigger: RefreshTrigger)
where
    F: Fn(RefreshTrigger) -> Fut,
    Fut: Future<Output = RefreshOutcome>,
{
    debug!(trigger = ?trigger, "Starting refresh check");
    let outcome = refresh_fn(trigger).await;
    match &outcome {
        RefreshOutcome::Fresh => debug!("Calendar still fresh"),
        RefreshOutcome::Refreshed { added, saved } => {
            info!(added = added, saved = saved, "Calendar refreshed")
        }
        RefreshOutcome::Failed(error) => warn!(error = %error, "Calendar refresh failed"),
        RefreshOutcome::Cancelled => info!("Calendar refresh cancelled"),
    }
    state.write().await.record(outcome);
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Forces an immediate refresh.
    pub async fn refresh_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::RefreshNow).await
    }

    /// Stops the scheduler.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns the current scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}
