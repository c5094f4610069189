// crates/appflag-core/src/core/mod.rs
// ============================================================================
// Module: appflag Core Types
// Description: Canonical documents, contexts, targets, and results.
// Purpose: Provide stable, serializable types shared by every appflag crate.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Core types describe what is fetched (configuration documents), what it is
//! fetched for (configuration targets), what callers supply (evaluation
//! contexts), and what evaluation returns (resolutions).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod context;
pub mod document;
pub mod resolution;
pub mod target;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::EvaluationContext;
pub use document::ConfigurationDocument;
pub use document::DocumentError;
pub use document::DocumentSchema;
pub use document::FLAG_STATE_ENABLED;
pub use document::FlagDefinition;
pub use document::RichDocument;
pub use document::RichFlag;
pub use document::RichRule;
pub use document::SimpleDocument;
pub use document::SimpleFlag;
pub use document::SimpleRule;
pub use document::Targeting;
pub use resolution::FlagEvaluationRequest;
pub use resolution::Resolution;
pub use resolution::ResolutionDetails;
pub use resolution::ResolutionReason;
pub use target::CACHE_KEY_PREFIX;
pub use target::ConfigurationTarget;
pub use target::SourceType;
pub use time::Clock;
pub use time::ManualClock;
pub use time::SystemClock;
pub use time::is_expired;
