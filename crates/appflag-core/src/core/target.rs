// crates/appflag-core/src/core/target.rs
// ============================================================================
// Module: appflag Configuration Targets
// Description: Identifiers for configuration documents and their sources.
// Purpose: Provide the {application, environment, profile} triple and source kinds.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ConfigurationTarget`] names exactly one configuration document in the
//! remote store. [`SourceType`] names the backend a document is fetched from
//! and participates in cache keys so documents cached for one source type are
//! never served to another.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix applied to every cache key produced by this crate.
pub const CACHE_KEY_PREFIX: &str = "appflag";

// ============================================================================
// SECTION: Source Type
// ============================================================================

/// Configured kind of configuration source.
///
/// # Invariants
/// - Labels are stable; they are embedded in cache keys.
/// - `Hybrid` is served by the remote-API source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// Direct calls to the remote configuration API.
    #[default]
    RemoteApi,
    /// Local agent files plus optional sidecar HTTP evaluation.
    Agent,
    /// Remote API used as the fallback for agent-first deployments.
    Hybrid,
}

impl SourceType {
    /// Returns the stable label for the source type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RemoteApi => "remote-api",
            Self::Agent => "agent",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Configuration Target
// ============================================================================

/// Identifies one configuration document in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationTarget {
    /// Application identifier.
    pub application: String,
    /// Environment identifier.
    pub environment: String,
    /// Configuration profile identifier.
    pub profile: String,
}

impl ConfigurationTarget {
    /// Creates a new configuration target.
    #[must_use]
    pub fn new(
        application: impl Into<String>,
        environment: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            environment: environment.into(),
            profile: profile.into(),
        }
    }

    /// Builds the deterministic cache key for this target and source type.
    #[must_use]
    pub fn cache_key(&self, source_type: SourceType) -> String {
        format!(
            "{CACHE_KEY_PREFIX}:{}:{}:{}:{}",
            source_type.as_str(),
            self.application,
            self.environment,
            self.profile
        )
    }
}

impl fmt::Display for ConfigurationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.application, self.environment, self.profile)
    }
}
