//! Periodic eviction of stale dashboard summaries.
//!
//! Lookups already ignore expired entries; this task only frees the memory
//! held by summaries for scopes nobody has asked for since.

use std::sync::Arc;
use std::time::Duration;

use eduscope_core::dashboard::DashboardComposer;
use tokio_util::sync::CancellationToken;

/// How often the eviction sweep runs.
pub const EVICTION_INTERVAL: Duration = Duration::from_secs(300);

/// Run the eviction loop until `cancel` is triggered.
pub async fn run(composer: Arc<DashboardComposer>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Summary cache eviction started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Summary cache eviction stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = composer.evict_stale();
                if evicted > 0 {
                    tracing::info!(evicted, "Summary cache: evicted stale entries");
                } else {
                    tracing::debug!("Summary cache: nothing to evict");
                }
            }
        }
    }
}
