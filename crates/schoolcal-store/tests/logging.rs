//! Cache operations with a global JSON subscriber installed.

mod support;

use std::sync::Arc;

use schoolcal_core::{LogFormat, SchoolEvent, init_tracing};
use tempfile::TempDir;
use tracing::Level;

use support::{MockProvider, may, new_cache};

#[tokio::test]
async fn cache_runs_under_json_logging() {
    init_tracing(Level::DEBUG, LogFormat::Json).unwrap();
    assert!(init_tracing(Level::INFO, LogFormat::Text).is_err());

    let dir = TempDir::new().unwrap();
    let cache = new_cache(&dir, Arc::new(MockProvider::new()));
    cache
        .merge_events(vec![SchoolEvent::new("Science Fair", may(1), "phs")])
        .await;
    assert!(cache.save().await);

    let restored = new_cache(&dir, Arc::new(MockProvider::new()));
    assert!(restored.load().await);
    assert!(restored.has_events(may(1)).await);
}
