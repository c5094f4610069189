// crates/appflag-core/src/runtime/cache.rs
// ============================================================================
// Module: appflag In-Memory Cache Store
// Description: Process-local cache store with per-entry TTL.
// Purpose: Provide a deterministic cache store for hosts, tests, and examples.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryCacheStore`] keeps entries in a mutex-guarded map and expires
//! them lazily on read using the same strict staleness rule as the
//! configuration manager. Clones share the same underlying map.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::Clock;
use crate::core::SystemClock;
use crate::core::is_expired;
use crate::interfaces::CacheError;
use crate::interfaces::CacheStore;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Stored cache value with its write time and TTL.
#[derive(Debug, Clone)]
struct StoredEntry {
    /// Encoded entry bytes.
    bytes: Vec<u8>,
    /// Unix seconds at write time.
    stored_at: i64,
    /// Time-to-live for the entry.
    ttl: Duration,
}

/// In-memory cache store.
#[derive(Clone)]
pub struct InMemoryCacheStore {
    /// Entry map protected by a mutex.
    entries: Arc<Mutex<BTreeMap<String, StoredEntry>>>,
    /// Clock used for expiry.
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCacheStore {
    /// Creates a store that expires entries against the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a store that expires entries against the provided clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            clock,
        }
    }

    /// Returns the number of stored entries, including expired ones not yet evicted.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the store mutex is poisoned.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| CacheError::Store("cache store mutex poisoned".to_string()))?
            .len())
    }

    /// Returns true when the store holds no entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the store mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.clock.now_unix_secs();
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| CacheError::Store("cache store mutex poisoned".to_string()))?;
        let expired = match guard.get(key) {
            None => return Ok(None),
            Some(entry) => is_expired(entry.stored_at, now, entry.ttl),
        };
        if expired {
            guard.remove(key);
            return Ok(None);
        }
        Ok(guard.get(key).map(|entry| entry.bytes.clone()))
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let entry = StoredEntry {
            bytes: value,
            stored_at: self.clock.now_unix_secs(),
            ttl,
        };
        self.entries
            .lock()
            .map_err(|_| CacheError::Store("cache store mutex poisoned".to_string()))?
            .insert(key.to_string(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Store("cache store mutex poisoned".to_string()))?
            .remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Store("cache store mutex poisoned".to_string()))?
            .clear();
        Ok(())
    }
}
