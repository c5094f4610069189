// crates/appflag-core/src/interfaces/mod.rs
// ============================================================================
// Module: appflag Interfaces
// Description: Backend-agnostic interfaces for sources, caches, and logging.
// Purpose: Define the contract surfaces used by the evaluation pipeline.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how appflag integrates with configuration backends, cache
//! pools, and log sinks without embedding backend-specific details.
//! Implementations fail closed: probes report `false` rather than erroring, and
//! fetch failures surface as typed errors that callers convert into defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;

use crate::core::ConfigurationDocument;
use crate::core::ConfigurationTarget;
use crate::core::DocumentError;
use crate::core::FlagEvaluationRequest;
use crate::core::Resolution;
use crate::core::SourceType;

// ============================================================================
// SECTION: Configuration Source
// ============================================================================

/// Static capability flags of a configuration source.
///
/// # Invariants
/// - Values are constant per source implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCapabilities {
    /// Source documents may be refreshed on a polling schedule.
    pub supports_polling: bool,
    /// Source can receive change notifications via webhooks.
    pub supports_webhooks: bool,
}

/// Configuration source errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages carry the underlying cause text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Backend reported that the configuration does not exist.
    #[error("configuration not found: {0}")]
    ConfigurationNotFound(String),
    /// Backend transport or protocol failure.
    #[error("configuration backend error: {0}")]
    Backend(String),
    /// Local filesystem failure.
    #[error("configuration io error: {0}")]
    Io(String),
    /// Configuration document could not be parsed.
    #[error("configuration parse error: {0}")]
    Parse(String),
    /// Sidecar evaluation endpoint failure.
    #[error("sidecar evaluation error: {0}")]
    Sidecar(String),
    /// Operation is not supported by the source.
    #[error("unsupported source operation: {0}")]
    Unsupported(String),
}

impl SourceError {
    /// Returns true when the backend explicitly reported a missing configuration.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigurationNotFound(_))
    }
}

impl From<DocumentError> for SourceError {
    fn from(err: DocumentError) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Backend-agnostic configuration source.
pub trait ConfigurationSource: Send + Sync {
    /// Returns the kind of source.
    fn source_type(&self) -> SourceType;

    /// Returns the static capability flags of the source.
    fn capabilities(&self) -> SourceCapabilities;

    /// Fetches the configuration document for the target.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ConfigurationNotFound`] when the backend reports
    /// the target does not exist, and other [`SourceError`] variants for
    /// transport, I/O, or parse failures.
    fn load_configuration(
        &self,
        target: &ConfigurationTarget,
    ) -> Result<ConfigurationDocument, SourceError>;

    /// Best-effort liveness probe; returns false on any failure.
    fn is_available(&self, target: &ConfigurationTarget) -> bool;

    /// Returns the version captured by the most recent successful load.
    fn configuration_version(&self) -> Option<String>;

    /// Returns the last-modified marker captured by the most recent successful load.
    fn last_modified(&self) -> Option<String>;

    /// Returns true when the source can evaluate flags itself right now.
    ///
    /// Sources that delegate to a remote evaluator may run a bounded
    /// liveness probe to answer.
    fn supports_source_evaluation(&self) -> bool {
        false
    }

    /// Evaluates a single flag on the source side.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unsupported`] unless the source overrides this.
    fn evaluate_flag(&self, request: &FlagEvaluationRequest) -> Result<Resolution, SourceError> {
        Err(SourceError::Unsupported(format!(
            "{} source cannot evaluate flag {}",
            self.source_type(),
            request.flag_key
        )))
    }
}

// ============================================================================
// SECTION: Cache Store
// ============================================================================

/// Cache store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Backing store failure.
    #[error("cache store error: {0}")]
    Store(String),
    /// Entry could not be encoded or decoded.
    #[error("cache codec error: {0}")]
    Codec(String),
}

/// Opaque key/value store with per-entry TTL.
pub trait CacheStore: Send + Sync {
    /// Returns the entry bytes for `key`, or `None` when absent or expired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores entry bytes for `key` with the given TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the store cannot be written.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Deletes the entry for `key`; deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the store cannot be written.
    fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the store cannot be written.
    fn clear(&self) -> Result<(), CacheError>;
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Recoverable problem.
    Warn,
    /// Failed operation.
    Error,
}

impl LogLevel {
    /// Returns a stable label for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Structured log sink for pipeline events.
pub trait FlagLogger: Send + Sync {
    /// Records a message with structured key/value fields.
    fn log(&self, level: LogLevel, message: &str, fields: &[(&str, &str)]);

    /// Records a debug message.
    fn debug(&self, message: &str, fields: &[(&str, &str)]) {
        self.log(LogLevel::Debug, message, fields);
    }

    /// Records an info message.
    fn info(&self, message: &str, fields: &[(&str, &str)]) {
        self.log(LogLevel::Info, message, fields);
    }

    /// Records a warning.
    fn warn(&self, message: &str, fields: &[(&str, &str)]) {
        self.log(LogLevel::Warn, message, fields);
    }

    /// Records an error.
    fn error(&self, message: &str, fields: &[(&str, &str)]) {
        self.log(LogLevel::Error, message, fields);
    }
}

/// Logger that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl FlagLogger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: &str, _fields: &[(&str, &str)]) {}
}
