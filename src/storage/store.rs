//! In-Memory Session Store
//!
//! Keyed session payloads with last-touched timestamps. Payload and
//! timestamp share one record behind one lock, so every operation and every
//! sweep sees either the whole entry or nothing.

use std::fmt;
use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::entry::{Entry, Payload};
use super::reaper::{Reaper, ReaperHandle};
use super::{
    KeyGenerationError, KeyGenerator, RandomKeyGenerator, Result, StoreConfig, StoreError,
};
use crate::metrics::StoreMetrics;

pub(super) struct Shared {
    entries: Mutex<HashMap<String, Entry>>,
    keys: Box<dyn KeyGenerator>,
    config: StoreConfig,
    metrics: StoreMetrics,
}

/// Thread-safe session store with TTL eviction.
///
/// Clones share the same entries. Eviction is driven by a [`Reaper`] (see
/// [`SessionStore::spawn_reaper`]) or by calling [`SessionStore::sweep_expired`]
/// directly.
#[derive(Clone)]
pub struct SessionStore {
    shared: Arc<Shared>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.shared.config)
            .field("len", &self.len())
            .finish()
    }
}

impl SessionStore {
    /// Create an empty store using random keys
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_key_generator(config, RandomKeyGenerator::default())
    }

    /// Create an empty store with a custom key source
    pub fn with_key_generator<G>(config: StoreConfig, keys: G) -> Result<Self>
    where
        G: KeyGenerator + 'static,
    {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(HashMap::new()),
                keys: Box::new(keys),
                config,
                metrics: StoreMetrics::new(),
            }),
        })
    }

    /// Create a store and spawn its reaper on the current tokio runtime
    pub fn start(config: StoreConfig) -> Result<(Self, ReaperHandle)> {
        let store = Self::new(config)?;
        let reaper = store.spawn_reaper();
        Ok((store, reaper))
    }

    /// Spawn a background reaper for this store.
    ///
    /// Must be called from within a tokio runtime. The reaper stops when the
    /// returned handle is stopped or dropped, or once every store clone is gone.
    pub fn spawn_reaper(&self) -> ReaperHandle {
        Reaper::spawn(self)
    }

    /// Create a new session with an empty payload and return its key
    pub fn create(&self) -> Result<String> {
        // The generator runs outside the lock
        let key = self.shared.keys.generate().inspect_err(|e| {
            self.shared.metrics.record_key_failure();
            warn!(error = %e, "Key generator failed");
        })?;

        let inserted = {
            let mut entries = self.shared.entries.lock();
            if entries.contains_key(&key) {
                false
            } else {
                entries.insert(key.clone(), Entry::new(Instant::now()));
                true
            }
        };

        if !inserted {
            self.shared.metrics.record_key_failure();
            warn!(key = %key, "Key generator returned a key already in use");
            return Err(KeyGenerationError::new("generated key is already in use").into());
        }

        self.shared.metrics.record_create();
        debug!(key = %key, "Session created");
        Ok(key)
    }

    /// Get a copy of the payload. Reading does not refresh the entry.
    pub fn read(&self, key: &str) -> Result<Payload> {
        let payload = self
            .shared
            .entries
            .lock()
            .get(key)
            .map(|entry| entry.payload.clone());

        self.shared.metrics.record_read(payload.is_some());
        payload.ok_or_else(|| StoreError::not_found(key))
    }

    /// Replace the payload wholesale and refresh the entry's timestamp
    pub fn update(&self, key: &str, payload: Payload) -> Result<()> {
        let updated = {
            let mut entries = self.shared.entries.lock();
            match entries.get_mut(key) {
                Some(entry) => {
                    entry.replace(payload, Instant::now());
                    true
                }
                None => false,
            }
        };

        self.shared.metrics.record_update(updated);
        if updated {
            Ok(())
        } else {
            Err(StoreError::not_found(key))
        }
    }

    /// Remove a session before it expires
    pub fn delete(&self, key: &str) -> Result<()> {
        let removed = self.shared.entries.lock().remove(key).is_some();
        if !removed {
            return Err(StoreError::not_found(key));
        }

        self.shared.metrics.record_delete();
        debug!(key = %key, "Session deleted");
        Ok(())
    }

    /// Check whether a session is present
    pub fn contains(&self, key: &str) -> bool {
        self.shared.entries.lock().contains_key(key)
    }

    /// Get the number of live sessions
    pub fn len(&self) -> usize {
        self.shared.entries.lock().len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all keys (for debugging/testing)
    pub fn keys(&self) -> Vec<String> {
        self.shared.entries.lock().keys().cloned().collect()
    }

    /// Get the expiry settings
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Get the counters shared with the reaper
    pub fn metrics(&self) -> &StoreMetrics {
        &self.shared.metrics
    }

    /// Remove entries whose age reached the TTL, returns count of removed entries
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    /// Like [`sweep_expired`](Self::sweep_expired) with an explicit clock reading
    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let started = std::time::Instant::now();
        let ttl = self.shared.config.ttl;

        let removed = {
            let mut entries = self.shared.entries.lock();
            let before = entries.len();
            entries.retain(|key, entry| {
                if entry.is_expired(now, ttl) {
                    debug!(key = %key, age = ?entry.age(now), "Session expired and removed");
                    false
                } else {
                    true
                }
            });
            before - entries.len()
        };

        self.shared.metrics.record_sweep(removed, started.elapsed());
        removed
    }

    pub(super) fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    pub(super) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }
}
