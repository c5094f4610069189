// crates/appflag-core/src/lib.rs
// ============================================================================
// Module: appflag Core Library
// Description: Public API surface for the appflag core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! appflag core models feature-flag configuration documents and evaluates
//! targeting rules against caller contexts. It is backend-agnostic: sources,
//! cache pools, and log sinks integrate through the traits in [`interfaces`].
//! Invariants:
//! - Evaluation is pure and fails closed on unparseable conditions.
//! - Documents use exactly one schema variant.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::CacheError;
pub use interfaces::CacheStore;
pub use interfaces::ConfigurationSource;
pub use interfaces::FlagLogger;
pub use interfaces::LogLevel;
pub use interfaces::NoopLogger;
pub use interfaces::SourceCapabilities;
pub use interfaces::SourceError;
pub use runtime::InMemoryCacheStore;
pub use runtime::evaluate_condition;
pub use runtime::evaluate_document;
pub use runtime::resolve;
pub use runtime::resolve_with_reason;

