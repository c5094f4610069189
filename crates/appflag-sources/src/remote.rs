// crates/appflag-sources/src/remote.rs
// ============================================================================
// Module: appflag Remote-API Source
// Description: Configuration source backed by a remote configuration store.
// Purpose: Adapt a ConfigurationBackend to the ConfigurationSource contract.
// Dependencies: appflag-core, crate::backend
// ============================================================================

//! ## Overview
//! [`RemoteApiSource`] fetches documents through a [`ConfigurationBackend`],
//! parses them, and records the version and last-modified markers of the most
//! recent successful load. It never evaluates flags itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use appflag_core::ConfigurationDocument;
use appflag_core::ConfigurationSource;
use appflag_core::ConfigurationTarget;
use appflag_core::SourceCapabilities;
use appflag_core::SourceError;
use appflag_core::SourceType;

use crate::backend::BackendError;
use crate::backend::ConfigurationBackend;
use crate::metadata::LoadMetadata;
use crate::metadata::MetadataSlot;

// ============================================================================
// SECTION: Source
// ============================================================================

/// Remote-API configuration source.
///
/// # Invariants
/// - Capabilities are constant: polling supported, webhooks not supported.
/// - Metadata only changes after a fully parsed load.
pub struct RemoteApiSource {
    /// Backend client.
    backend: Box<dyn ConfigurationBackend>,
    /// Metadata of the latest successful load.
    metadata: MetadataSlot,
}

impl RemoteApiSource {
    /// Capabilities shared by every remote-API source.
    pub const CAPABILITIES: SourceCapabilities = SourceCapabilities {
        supports_polling: true,
        supports_webhooks: false,
    };

    /// Creates a source that fetches through the backend.
    #[must_use]
    pub fn new(backend: Box<dyn ConfigurationBackend>) -> Self {
        Self {
            backend,
            metadata: MetadataSlot::default(),
        }
    }
}

impl ConfigurationSource for RemoteApiSource {
    fn source_type(&self) -> SourceType {
        SourceType::RemoteApi
    }

    fn capabilities(&self) -> SourceCapabilities {
        Self::CAPABILITIES
    }

    fn load_configuration(
        &self,
        target: &ConfigurationTarget,
    ) -> Result<ConfigurationDocument, SourceError> {
        let payload = self.backend.fetch_configuration(target).map_err(map_backend_error)?;
        let document = ConfigurationDocument::from_slice(&payload.content)?;
        let version =
            payload.version.or_else(|| document.declared_version().map(str::to_string));
        self.metadata.record(LoadMetadata {
            version,
            last_modified: payload.last_modified,
        })?;
        Ok(document)
    }

    fn is_available(&self, target: &ConfigurationTarget) -> bool {
        self.backend.probe(target)
    }

    fn configuration_version(&self) -> Option<String> {
        self.metadata.version()
    }

    fn last_modified(&self) -> Option<String> {
        self.metadata.last_modified()
    }
}

/// Maps backend failures onto source errors, keeping the cause text.
fn map_backend_error(err: BackendError) -> SourceError {
    match err {
        BackendError::NotFound(target) => SourceError::ConfigurationNotFound(target),
        other => SourceError::Backend(other.to_string()),
    }
}
