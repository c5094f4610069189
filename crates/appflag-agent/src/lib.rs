// crates/appflag-agent/src/lib.rs
// ============================================================================
// Module: appflag Agent
// Description: Local sidecar agent serving flag evaluations over HTTP.
// Purpose: Evaluate flags from the agent file layout for nearby clients.
// Dependencies: appflag-core, appflag-sources, tiny_http, tracing
// ============================================================================

//! ## Overview
//! The agent exposes the sidecar contract consumed by
//! [`appflag_sources::AgentSource`]: `GET /health`, `GET /` and
//! `POST /evaluate`. Evaluation reads documents from the agent file layout.
//! Invariants:
//! - Request bodies are size-limited.
//! - Target identifiers never escape the agent root.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use server::AgentError;
pub use server::AgentResponse;
pub use server::AgentServer;
pub use server::MAX_REQUEST_BYTES;
pub use server::SERVICE_NAME;
