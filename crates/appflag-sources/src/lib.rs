// crates/appflag-sources/src/lib.rs
// ============================================================================
// Module: appflag Sources
// Description: Built-in configuration sources for appflag.
// Purpose: Fetch configuration documents from remote stores or local agents.
// Dependencies: appflag-core, reqwest, serde, time
// ============================================================================

//! ## Overview
//! This crate ships the two built-in [`appflag_core::ConfigurationSource`]
//! implementations: [`RemoteApiSource`], which fetches through a
//! [`ConfigurationBackend`], and [`AgentSource`], which reads the local agent
//! file layout and delegates evaluation to a sidecar.
//! Invariants:
//! - Outbound HTTP requests are bounded by timeouts and size limits.
//! - Redirects are never followed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod agent;
pub mod backend;
pub mod http;
mod metadata;
pub mod remote;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use agent::AgentSource;
pub use agent::AgentSourceConfig;
pub use backend::BackendConfiguration;
pub use backend::BackendError;
pub use backend::ConfigurationBackend;
pub use backend::HttpBackendConfig;
pub use backend::HttpConfigurationBackend;
pub use remote::RemoteApiSource;
