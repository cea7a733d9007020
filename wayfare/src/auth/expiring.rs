//! Bounded, process-local key/value store whose entries expire.
//!
//! Holds short-lived login state: OAuth flow state between the redirect to the identity
//! provider and the callback, and one-time login codes between the callback and the token
//! exchange. Entries are single use ([`ExpiringStore::take`] removes them) and expire lazily
//! on read; [`run_sweeper`] clears out whatever is never read.

use dashmap::DashMap;
use std::{
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Returned when a store is at capacity even after dropping expired entries
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("store is full ({capacity} pending entries)")]
pub struct StoreFull {
    pub capacity: usize,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Cheap to clone; clones share the same entries.
///
/// An insert reserves a slot in `reserved` before touching the map, so the map never holds
/// more than `capacity` entries, even under concurrent inserts.
#[derive(Debug)]
pub struct ExpiringStore<K: Eq + Hash, V> {
    entries: Arc<DashMap<K, Entry<V>>>,
    reserved: Arc<AtomicUsize>,
    ttl: Duration,
    capacity: usize,
}

impl<K: Eq + Hash, V> Clone for ExpiringStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            reserved: Arc::clone(&self.reserved),
            ttl: self.ttl,
            capacity: self.capacity,
        }
    }
}

impl<K, V> ExpiringStore<K, V>
where
    K: Eq + Hash,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            reserved: Arc::new(AtomicUsize::new(0)),
            ttl,
            capacity,
        }
    }

    /// Store `value` under `key` for the store's TTL, replacing any previous value.
    pub fn insert(&self, key: K, value: V) -> Result<(), StoreFull> {
        if !self.try_reserve() {
            self.sweep();
            if !self.try_reserve() {
                return Err(StoreFull { capacity: self.capacity });
            }
        }

        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        // Replacing a key does not grow the map
        if self.entries.insert(key, entry).is_some() {
            self.release(1);
        }
        Ok(())
    }

    /// Remove and return the value for `key` if it has not expired.
    pub fn take(&self, key: &K) -> Option<V> {
        let (_, entry) = self.entries.remove(key)?;
        self.release(1);
        (entry.expires_at > Instant::now()).then_some(entry.value)
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = entry.expires_at > now;
            removed += usize::from(!live);
            live
        });
        self.release(removed);
        removed
    }

    fn try_reserve(&self) -> bool {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.capacity).then_some(n + 1))
            .is_ok()
    }

    fn release(&self, n: usize) {
        if n > 0 {
            self.reserved.fetch_sub(n, Ordering::AcqRel);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Call `sweep` every `interval` until `shutdown` is cancelled.
pub async fn run_sweeper<F>(interval: Duration, shutdown: CancellationToken, sweep: F)
where
    F: Fn() -> usize + Send + 'static,
{
    info!(interval = ?interval, "Starting expiring store sweeper");
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let removed = sweep();
                if removed > 0 {
                    debug!(removed, "Swept expired login state");
                }
            }
            _ = shutdown.cancelled() => {
                info!("Expiring store sweeper shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_take_is_single_use() {
        let store = ExpiringStore::new(Duration::from_secs(60), 10);
        store.insert("code".to_string(), 42).unwrap();

        assert_eq!(store.take(&"code".to_string()), Some(42));
        assert_eq!(store.take(&"code".to_string()), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_never_returned() {
        let store = ExpiringStore::new(Duration::from_secs(300), 10);
        store.insert("code", "user").unwrap();

        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(store.take(&"code"), None);
        // The expired entry was removed on read
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_store_evicts_expired_first() {
        let store = ExpiringStore::new(Duration::from_secs(10), 2);
        store.insert(1, "a").unwrap();
        store.insert(2, "b").unwrap();

        assert_eq!(store.insert(3, "c"), Err(StoreFull { capacity: 2 }));

        tokio::time::advance(Duration::from_secs(11)).await;
        store.insert(3, "c").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.take(&3), Some("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_a_key_keeps_its_slot() {
        let store = ExpiringStore::new(Duration::from_secs(10), 1);
        store.insert("state", 1).unwrap();
        store.insert("state", 2).unwrap();
        assert_eq!(store.take(&"state"), Some(2));

        store.insert("next", 3).unwrap();
        assert_eq!(store.insert("other", 4), Err(StoreFull { capacity: 1 }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_respect_capacity() {
        let store = ExpiringStore::new(Duration::from_secs(60), 16);

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(i, i).is_ok() })
            })
            .collect();

        let mut accepted = 0;
        for task in tasks {
            accepted += usize::from(task.await.unwrap());
        }

        assert_eq!(accepted, 16);
        assert_eq!(store.len(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_counts_removed() {
        let store = ExpiringStore::new(Duration::from_secs(5), 10);
        store.insert("old", 1).unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        store.insert("new", 2).unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(store.sweep(), 1);
        assert_eq!(store.take(&"new"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_entries() {
        let store = ExpiringStore::new(Duration::from_secs(5), 10);
        let other = store.clone();
        store.insert("k", 1).unwrap();
        assert_eq!(other.take(&"k"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_on_shutdown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();

        let counter = Arc::clone(&calls);
        let handle = tokio::spawn(run_sweeper(Duration::from_secs(1), shutdown.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            0
        }));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
