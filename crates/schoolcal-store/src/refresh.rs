//! Refresh policy types: staleness, outcomes, phases and cancellation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// Decides when cached data must be refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    /// Data older than this is stale.
    pub max_age: Duration,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_AGE)
    }
}

impl StalenessPolicy {
    /// One week.
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Creates a policy with the given maximum age.
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// Creates a policy with a maximum age in whole days, saturating at
    /// `u64::MAX` seconds.
    pub fn days(days: u64) -> Self {
        Self::new(Duration::from_secs(days.saturating_mul(24 * 60 * 60)))
    }

    /// Returns true if data last updated at `last` must be refreshed at `now`.
    ///
    /// Never having been updated is stale. A maximum age too large for chrono
    /// means nothing is ever stale by age.
    pub fn is_stale(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(last) = last else {
            return true;
        };
        match chrono::Duration::from_std(self.max_age) {
            Ok(max_age) => now
                .checked_sub_signed(max_age)
                .is_some_and(|cutoff| last < cutoff),
            Err(_) => false,
        }
    }
}

/// Result of one `ensure_fresh` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Cached data was recent enough; nothing was fetched.
    Fresh,
    /// Feeds were fetched and merged.
    Refreshed {
        /// Number of events appended to the store.
        added: usize,
        /// Whether the archive write succeeded (and the timestamp moved).
        saved: bool,
    },
    /// A fetch failed; the store is unchanged.
    Failed(String),
    /// The refresh was cancelled while fetching; the store is unchanged.
    Cancelled,
}

impl RefreshOutcome {
    /// Returns true if new data was merged.
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed { .. })
    }

    /// Returns the failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Where a refresh cycle currently is.
///
/// A cycle goes `Idle → Fetching → Merging → Saving → UpdatingTimestamp → Idle`,
/// or straight back from `Fetching` to `Idle` on failure or cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RefreshPhase {
    #[default]
    Idle,
    Fetching,
    Merging,
    Saving,
    UpdatingTimestamp,
}

impl RefreshPhase {
    /// Returns the snake_case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Merging => "merging",
            Self::Saving => "saving",
            Self::UpdatingTimestamp => "updating_timestamp",
        }
    }
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cancels the fetch of an in-flight refresh.
///
/// Each cancel bumps a generation counter. A refresh cycle subscribes when it
/// starts and stops at the next bump, so a cancel issued while no refresh is
/// running does not affect later ones.
#[derive(Debug, Clone)]
pub struct RefreshCancel {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for RefreshCancel {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshCancel {
    /// Creates a new cancel handle.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Cancels the refresh currently fetching, if any.
    pub fn cancel(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    /// Subscribes to cancellations issued from now on.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn default_policy_is_one_week() {
        assert_eq!(
            StalenessPolicy::default().max_age,
            Duration::from_secs(604_800)
        );
        assert_eq!(StalenessPolicy::days(7), StalenessPolicy::default());
    }

    #[test]
    fn never_updated_is_stale() {
        assert!(StalenessPolicy::default().is_stale(None, noon(1)));
    }

    #[test]
    fn stale_only_past_max_age() {
        let policy = StalenessPolicy::default();

        assert!(!policy.is_stale(Some(noon(1)), noon(2)));
        assert!(!policy.is_stale(Some(noon(1)), noon(8)));
        assert!(policy.is_stale(Some(noon(1)), noon(9)));
    }

    #[test]
    fn huge_max_age_never_stale() {
        let policy = StalenessPolicy::new(Duration::MAX);
        assert!(!policy.is_stale(Some(noon(1)), noon(30)));
    }

    #[test]
    fn days_saturates_instead_of_overflowing() {
        let policy = StalenessPolicy::days(300_000_000_000_000);
        assert_eq!(policy.max_age, Duration::from_secs(u64::MAX));
        assert!(!policy.is_stale(Some(noon(1)), noon(30)));
    }

    #[test]
    fn outcome_helpers() {
        assert!(RefreshOutcome::Refreshed { added: 1, saved: true }.is_refreshed());
        assert!(!RefreshOutcome::Fresh.is_refreshed());
        assert_eq!(RefreshOutcome::Failed("boom".into()).error(), Some("boom"));
        assert_eq!(RefreshOutcome::Cancelled.error(), None);
    }

    #[test]
    fn phase_names() {
        assert_eq!(RefreshPhase::default(), RefreshPhase::Idle);
        assert_eq!(RefreshPhase::UpdatingTimestamp.to_string(), "updating_timestamp");
    }

    #[tokio::test]
    async fn cancel_wakes_subscribers() {
        let cancel = RefreshCancel::new();
        let mut rx = cancel.subscribe();

        cancel.clone().cancel();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
    }

    #[tokio::test]
    async fn cancel_before_subscribe_is_not_seen() {
        let cancel = RefreshCancel::new();
        cancel.cancel();

        let rx = cancel.subscribe();
        assert!(!rx.has_changed().unwrap());
    }
}
