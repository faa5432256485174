//! Cache Store Module
//!
//! Bounded key/value cache whose entries remove themselves after a fixed
//! lifetime.
//!
//! Two independent forces bound the store:
//! - **Admission**: a `put` arriving while `size() >= max_size` is dropped.
//!   Nothing is displaced to make room, so under sustained load at capacity
//!   new values are not cached until an entry expires or is removed.
//! - **Expiry**: each successful `put` schedules one removal `max_age` later
//!   on the background expiry task. The removal carries the generation of the
//!   insertion that scheduled it and is a no-op if the key has since been
//!   removed or overwritten.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::keys::FamilyKey;
use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::tasks::{spawn_expiry_task, ExpiryRequest, ExpirySink};

// State shared with the expiry task.
pub(crate) struct Shared<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    stats: StatsRecorder,
}

impl<K, V> ExpirySink<K> for Shared<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn expire(&self, key: &K, generation: u64) -> bool {
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.generation == generation)
            .is_some();
        if removed {
            self.stats.record_expiration();
        }
        removed
    }
}

// == Bounded TTL Cache ==
/// Concurrent cache with reject-on-full admission and per-entry expiry.
///
/// All operations take `&self` and are safe to call from many tasks at once;
/// share the cache behind an `Arc`.
pub struct BoundedTtlCache<K, V> {
    shared: Arc<Shared<K, V>>,
    max_age: Duration,
    max_size: usize,
    next_generation: AtomicU64,
    expiry_tx: mpsc::UnboundedSender<ExpiryRequest<K>>,
    shutdown_tx: watch::Sender<bool>,
    expiry_task: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> BoundedTtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache and spawns its expiry task on the current Tokio runtime.
    ///
    /// # Errors
    /// `AppError::InvalidConfig` if `max_age` or `max_size` is zero, or if no
    /// Tokio runtime is running.
    pub fn new(max_age: Duration, max_size: usize) -> Result<Self> {
        if max_age.is_zero() {
            return Err(AppError::InvalidConfig(
                "cache max_age must be positive".to_string(),
            ));
        }
        if max_size == 0 {
            return Err(AppError::InvalidConfig(
                "cache max_size must be positive".to_string(),
            ));
        }
        let handle = Handle::try_current().map_err(|_| {
            AppError::InvalidConfig("cache must be created inside a Tokio runtime".to_string())
        })?;

        let shared = Arc::new(Shared {
            entries: DashMap::new(),
            stats: StatsRecorder::default(),
        });
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let expiry_task =
            spawn_expiry_task(&handle, Arc::downgrade(&shared), expiry_rx, shutdown_rx);

        info!(
            "Cache created: max_age={}ms, max_size={}",
            max_age.as_millis(),
            max_size
        );

        Ok(Self {
            shared,
            max_age,
            max_size,
            next_generation: AtomicU64::new(1),
            expiry_tx,
            shutdown_tx,
            expiry_task: Mutex::new(Some(expiry_task)),
        })
    }

    /// Creates a cache sized from the server configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.cache_max_age(), config.cache_max_size)
    }

    // == Put ==
    /// Stores `value` under `key` and schedules its removal after `max_age`.
    ///
    /// Returns false, storing nothing, when the cache already holds
    /// `max_size` entries. This applies to overwrites of an existing key too.
    pub fn put(&self, key: K, value: V) -> bool {
        if self.shared.entries.len() >= self.max_size {
            self.shared.stats.record_rejection();
            debug!("Cache full ({} entries), put dropped", self.max_size);
            return false;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entry = CacheEntry::new(value, self.max_age, generation);
        let deadline = entry.deadline();
        self.shared.entries.insert(key.clone(), entry);

        let request = ExpiryRequest {
            key,
            generation,
            deadline,
        };
        if self.expiry_tx.send(request).is_err() {
            warn!("Expiry task is not running; entry will not expire");
        }
        true
    }

    // == Get ==
    /// Returns a clone of the value stored under `key`.
    ///
    /// An entry past its deadline whose removal has not run yet is reported
    /// as absent. Lookups never extend an entry's lifetime.
    pub fn get(&self, key: &K) -> Option<V> {
        let value = self
            .shared
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone());

        match value {
            Some(_) => self.shared.stats.record_hit(),
            None => self.shared.stats.record_miss(),
        }
        value
    }

    // == Remove ==
    /// Deletes any entry stored under `key`. Removing an absent key is a no-op.
    pub fn remove(&self, key: &K) {
        self.shared.entries.remove(key);
    }

    /// Removes every entry whose key matches `predicate`, returning how many.
    pub fn invalidate_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let mut removed = 0;
        self.shared.entries.retain(|key, _| {
            if predicate(key) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Number of stored entries. Advisory under concurrent mutation.
    pub fn size(&self) -> usize {
        self.shared.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.entries.is_empty()
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.shared.stats.snapshot(self.size())
    }
}

impl<K, V> BoundedTtlCache<K, V>
where
    K: FamilyKey + Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Removes every entry whose key belongs to `family`, returning how many.
    pub fn invalidate_family(&self, family: &K::Family) -> usize {
        let removed = self.invalidate_where(|key| key.family() == *family);
        if removed > 0 {
            debug!("Invalidated {} cached entries", removed);
        }
        removed
    }
}

impl<K, V> BoundedTtlCache<K, V> {
    // == Shutdown ==
    /// Stops the expiry task. Idempotent.
    ///
    /// Pending expirations are discarded; entries stored afterwards never
    /// expire. Intended for process teardown only.
    pub fn shutdown(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Cache shutting down expiry task");
        }
    }

    /// True while the expiry task is alive.
    pub fn is_running(&self) -> bool {
        self.expiry_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Shuts down and waits for the expiry task to finish.
    pub async fn shutdown_and_wait(&self) {
        self.shutdown();
        let task = self.expiry_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Expiry task ended abnormally: {}", e);
            }
        }
    }
}

impl<K, V> Drop for BoundedTtlCache<K, V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
