// crates/appflag-sources/src/metadata.rs
// ============================================================================
// Module: appflag Source Metadata
// Description: Version and last-modified markers captured per load.
// Purpose: Share metadata bookkeeping between source implementations.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Sources record the metadata of their most recent successful load so callers
//! can inspect it without refetching. Reads on a poisoned lock report nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use appflag_core::SourceError;

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Metadata of a successful configuration load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LoadMetadata {
    /// Configuration version marker.
    pub(crate) version: Option<String>,
    /// Last-modified marker.
    pub(crate) last_modified: Option<String>,
}

/// Mutex-guarded slot holding the latest load metadata.
#[derive(Debug, Default)]
pub(crate) struct MetadataSlot {
    /// Latest metadata; default until the first successful load.
    inner: Mutex<LoadMetadata>,
}

impl MetadataSlot {
    /// Replaces the stored metadata.
    pub(crate) fn record(&self, metadata: LoadMetadata) -> Result<(), SourceError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| SourceError::Backend("metadata mutex poisoned".to_string()))?;
        *guard = metadata;
        Ok(())
    }

    /// Returns the stored version marker.
    pub(crate) fn version(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|guard| guard.version.clone())
    }

    /// Returns the stored last-modified marker.
    pub(crate) fn last_modified(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|guard| guard.last_modified.clone())
    }
}
