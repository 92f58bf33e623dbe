//! Refresh coordination: generation tokens, cancellation, and a summary cache.
//!
//! Every dashboard load takes a [`RefreshTicket`] from the [`RefreshTracker`].
//! Starting a newer load for the same viewer and channel cancels the older
//! one, and [`SummaryCache::store`] refuses results from a generation older
//! than the one already cached, so a slow stale response can never overwrite
//! fresh data.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::types::DbId;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// RefreshTracker
// ---------------------------------------------------------------------------

/// Handle for one in-flight load.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    pub generation: u64,
    viewer: DbId,
    channel: String,
    cancel: CancellationToken,
}

impl RefreshTicket {
    /// Resolves when a newer load for the same viewer and channel starts.
    pub async fn superseded(&self) {
        self.cancel.cancelled().await;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Hands out monotonically increasing generations per `(viewer, channel)`.
#[derive(Debug, Default)]
pub struct RefreshTracker {
    next: AtomicU64,
    inflight: Mutex<HashMap<(DbId, String), (u64, CancellationToken)>>,
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load, cancelling any older in-flight load on the same channel.
    pub fn begin(&self, viewer: DbId, channel: &str) -> RefreshTicket {
        let generation = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();

        let previous = lock(&self.inflight).insert(
            (viewer, channel.to_string()),
            (generation, cancel.clone()),
        );
        if let Some((old_generation, old_cancel)) = previous {
            tracing::debug!(
                viewer,
                channel,
                old_generation,
                generation,
                "Superseding in-flight dashboard load",
            );
            old_cancel.cancel();
        }

        RefreshTicket {
            generation,
            viewer,
            channel: channel.to_string(),
            cancel,
        }
    }

    /// Whether `viewer` has a load running on `channel`.
    pub fn is_inflight(&self, viewer: DbId, channel: &str) -> bool {
        lock(&self.inflight).contains_key(&(viewer, channel.to_string()))
    }

    /// Forget a finished load if it is still the current one.
    pub fn finish(&self, ticket: &RefreshTicket) {
        let mut inflight = lock(&self.inflight);
        let key = (ticket.viewer, ticket.channel.clone());
        if inflight
            .get(&key)
            .is_some_and(|(generation, _)| *generation == ticket.generation)
        {
            inflight.remove(&key);
        }
    }

    /// Number of loads currently tracked.
    pub fn inflight_count(&self) -> usize {
        lock(&self.inflight).len()
    }
}

// ---------------------------------------------------------------------------
// SummaryCache
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    generation: u64,
    stored_at: Instant,
}

/// In-memory cache of computed summaries with per-lookup staleness windows.
#[derive(Debug)]
pub struct SummaryCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> Default for SummaryCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Hash + Eq, V: Clone> SummaryCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value if it is younger than `stale_after`.
    pub fn get(&self, key: &K, stale_after: Duration) -> Option<V> {
        lock(&self.entries)
            .get(key)
            .filter(|e| e.stored_at.elapsed() < stale_after)
            .map(|e| e.value.clone())
    }

    /// Store a value computed by load `generation`.
    ///
    /// Returns `false` (and keeps the existing entry) when a newer generation
    /// has already been stored for this key.
    pub fn store(&self, key: K, generation: u64, value: V) -> bool {
        let mut entries = lock(&self.entries);
        if let Some(existing) = entries.get(&key) {
            if existing.generation > generation {
                return false;
            }
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                generation,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Drop entries older than `max_age`.
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, e| e.stored_at.elapsed() < max_age);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
