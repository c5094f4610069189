// crates/appflag-provider/src/manager.rs
// ============================================================================
// Module: appflag Configuration Manager
// Description: TTL-cached configuration acquisition for one target.
// Purpose: Decide when to serve, reuse, or refetch the configuration document.
// Dependencies: appflag-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`ConfigurationManager`] owns the in-memory document of one
//! configuration target and moves through three states:
//! Empty → Loaded → Stale → Loaded. Refreshes consult the shared cache store
//! before the source, and write fetched documents back with the TTL.
//! Invariants:
//! - Staleness is strict: `now - timestamp > ttl`.
//! - The in-memory document is replaced as a whole under a mutex; readers
//!   hold an `Arc` to the document they were given.
//! - Source failures never fall back to a stale document.
//! - Cache store failures are logged and treated as misses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use appflag_core::CacheStore;
use appflag_core::Clock;
use appflag_core::ConfigurationDocument;
use appflag_core::ConfigurationSource;
use appflag_core::ConfigurationTarget;
use appflag_core::FlagLogger;
use appflag_core::SourceError;
use appflag_core::is_expired;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Lifecycle state of the managed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// No document has been loaded.
    Empty,
    /// A document is loaded and within its TTL.
    Loaded,
    /// A document is loaded but older than its TTL.
    Stale,
}

/// Manager behaviour settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Time-to-live of loaded documents and cache entries.
    pub cache_ttl: Duration,
    /// Refresh stale documents on access.
    pub enable_polling: bool,
}

/// Serialized cache entry shared through the cache store.
///
/// # Invariants
/// - `timestamp` is the unix time of the source fetch, not of the cache write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Cached document.
    pub data: ConfigurationDocument,
    /// Unix seconds of the source fetch.
    pub timestamp: i64,
    /// Version captured at fetch time.
    #[serde(default)]
    pub version: Option<String>,
    /// Last-modified marker captured at fetch time.
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// Configuration refresh errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The source failed to produce a document.
    #[error("configuration refresh failed: {0}")]
    Source(#[from] SourceError),
}

/// Document currently held in memory.
#[derive(Debug, Clone)]
struct LoadedConfiguration {
    /// Shared document.
    document: Arc<ConfigurationDocument>,
    /// Unix seconds of the source fetch.
    fetched_at: i64,
    /// Version captured at fetch time.
    version: Option<String>,
    /// Last-modified marker captured at fetch time.
    last_modified: Option<String>,
}

// ============================================================================
// SECTION: Manager
// ============================================================================

/// TTL-cached configuration manager for a single target.
pub struct ConfigurationManager {
    /// Active configuration source.
    source: Arc<dyn ConfigurationSource>,
    /// Shared cache store.
    cache: Arc<dyn CacheStore>,
    /// Clock used for staleness checks.
    clock: Arc<dyn Clock>,
    /// Log sink.
    logger: Arc<dyn FlagLogger>,
    /// Target being managed.
    target: ConfigurationTarget,
    /// Cache key derived from the source type and target.
    cache_key: String,
    /// Behaviour settings.
    config: ManagerConfig,
    /// In-memory document slot.
    current: Mutex<Option<LoadedConfiguration>>,
}

impl ConfigurationManager {
    /// Creates a manager in the Empty state.
    #[must_use]
    pub fn new(
        source: Arc<dyn ConfigurationSource>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        logger: Arc<dyn FlagLogger>,
        target: ConfigurationTarget,
        config: ManagerConfig,
    ) -> Self {
        let cache_key = target.cache_key(source.source_type());
        Self {
            source,
            cache,
            clock,
            logger,
            target,
            cache_key,
            config,
            current: Mutex::new(None),
        }
    }

    /// Returns the current document, refreshing when empty or stale with polling.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError`] when a required refresh fails.
    pub fn get_configuration(&self) -> Result<Arc<ConfigurationDocument>, RefreshError> {
        let snapshot = self.slot().clone();
        match snapshot {
            Some(loaded) if !(self.config.enable_polling && self.expired(loaded.fetched_at)) => {
                Ok(loaded.document)
            }
            _ => self.refresh_configuration(),
        }
    }

    /// Reloads the document from the cache store or the source.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError`] when the source fails.
    pub fn refresh_configuration(&self) -> Result<Arc<ConfigurationDocument>, RefreshError> {
        if let Some(entry) = self.read_cache_entry() {
            self.logger.debug(
                "configuration served from cache",
                &[("cache_key", self.cache_key.as_str())],
            );
            return Ok(self.install(LoadedConfiguration {
                document: Arc::new(entry.data),
                fetched_at: entry.timestamp,
                version: entry.version,
                last_modified: entry.last_modified,
            }));
        }

        let document = self.source.load_configuration(&self.target).map_err(|err| {
            let message = err.to_string();
            self.logger.error(
                "configuration fetch failed",
                &[("target", self.target.to_string().as_str()), ("error", message.as_str())],
            );
            RefreshError::Source(err)
        })?;
        let loaded = LoadedConfiguration {
            document: Arc::new(document),
            fetched_at: self.clock.now_unix_secs(),
            version: self.source.configuration_version(),
            last_modified: self.source.last_modified(),
        };
        self.write_cache_entry(&loaded);
        self.logger.info(
            "configuration refreshed",
            &[
                ("target", self.target.to_string().as_str()),
                ("version", loaded.version.as_deref().unwrap_or("unknown")),
            ],
        );
        Ok(self.install(loaded))
    }

    /// Deletes the cache entry and resets to Empty.
    pub fn clear_cache(&self) {
        if let Err(err) = self.cache.delete(&self.cache_key) {
            self.logger.warn(
                "cache delete failed",
                &[("cache_key", self.cache_key.as_str()), ("error", err.to_string().as_str())],
            );
        }
        *self.slot() = None;
    }

    /// Returns true when no document is loaded or the loaded one is past its TTL.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.state() != ManagerState::Loaded
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ManagerState {
        match self.slot().as_ref() {
            None => ManagerState::Empty,
            Some(loaded) if self.expired(loaded.fetched_at) => ManagerState::Stale,
            Some(_) => ManagerState::Loaded,
        }
    }

    /// Returns the cache key used for this target.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Returns the managed target.
    #[must_use]
    pub const fn target(&self) -> &ConfigurationTarget {
        &self.target
    }

    /// Returns the version of the loaded document.
    #[must_use]
    pub fn configuration_version(&self) -> Option<String> {
        self.slot().as_ref().and_then(|loaded| loaded.version.clone())
    }

    /// Returns the last-modified marker of the loaded document.
    #[must_use]
    pub fn last_modified(&self) -> Option<String> {
        self.slot().as_ref().and_then(|loaded| loaded.last_modified.clone())
    }

    /// Locks the document slot; the slot is always whole, so poisoning is ignored.
    fn slot(&self) -> MutexGuard<'_, Option<LoadedConfiguration>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the in-memory document and returns it.
    fn install(&self, loaded: LoadedConfiguration) -> Arc<ConfigurationDocument> {
        let document = Arc::clone(&loaded.document);
        *self.slot() = Some(loaded);
        document
    }

    /// Returns true when a fetch at `timestamp` is past the TTL.
    fn expired(&self, timestamp: i64) -> bool {
        is_expired(timestamp, self.clock.now_unix_secs(), self.config.cache_ttl)
    }

    /// Returns a decodable, fresh cache entry, if any.
    fn read_cache_entry(&self) -> Option<CacheEntry> {
        let bytes = match self.cache.get(&self.cache_key) {
            Ok(bytes) => bytes?,
            Err(err) => {
                self.logger.warn(
                    "cache read failed",
                    &[("cache_key", self.cache_key.as_str()), ("error", err.to_string().as_str())],
                );
                return None;
            }
        };
        let entry = match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                self.logger.warn(
                    "cache entry undecodable",
                    &[("cache_key", self.cache_key.as_str()), ("error", err.to_string().as_str())],
                );
                return None;
            }
        };
        if self.expired(entry.timestamp) {
            self.logger.debug("cache entry stale", &[("cache_key", self.cache_key.as_str())]);
            return None;
        }
        Some(entry)
    }

    /// Writes the loaded document back to the cache store.
    fn write_cache_entry(&self, loaded: &LoadedConfiguration) {
        let entry = CacheEntry {
            data: loaded.document.as_ref().clone(),
            timestamp: loaded.fetched_at,
            version: loaded.version.clone(),
            last_modified: loaded.last_modified.clone(),
        };
        let result = serde_json::to_vec(&entry)
            .map_err(|err| err.to_string())
            .and_then(|bytes| {
                self.cache
                    .set(&self.cache_key, bytes, self.config.cache_ttl)
                    .map_err(|err| err.to_string())
            });
        if let Err(message) = result {
            self.logger.warn(
                "cache write failed",
                &[("cache_key", self.cache_key.as_str()), ("error", message.as_str())],
            );
        }
    }
}
