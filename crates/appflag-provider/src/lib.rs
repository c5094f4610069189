// crates/appflag-provider/src/lib.rs
// ============================================================================
// Module: appflag Provider
// Description: Feature-flag provider facade with TTL-cached configuration.
// Purpose: Resolve typed flag values from managed configuration documents.
// Dependencies: appflag-config, appflag-core, appflag-sources, tracing
// ============================================================================

//! ## Overview
//! [`FeatureFlagProvider`] is the application-facing entry point. It owns a
//! [`ConfigurationManager`] for the configured target and resolves typed flag
//! values, delegating to the source when the source evaluates flags itself.
//! Invariants:
//! - Flag resolution never returns an error to the caller; failures surface
//!   as the caller default with reason `ERROR`.
//! - Log records flow through [`appflag_core::FlagLogger`]; the default
//!   implementation forwards to `tracing`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod logging;
pub mod manager;
pub mod provider;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use logging::TracingLogger;
pub use manager::CacheEntry;
pub use manager::ConfigurationManager;
pub use manager::ManagerConfig;
pub use manager::ManagerState;
pub use manager::RefreshError;
pub use provider::FeatureFlagProvider;
pub use provider::PROVIDER_NAME;
pub use provider::ProviderBuilder;
pub use provider::ProviderError;
pub use provider::select_source;
pub use value::FlagValue;
