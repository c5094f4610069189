// crates/appflag-core/src/runtime/mod.rs
// ============================================================================
// Module: appflag Runtime
// Description: Condition evaluation, rule resolution, and in-memory caching.
// Purpose: Implement the pure evaluation pipeline shared by sources and providers.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime helpers are pure functions over core types plus a reference
//! [`CacheStore`](crate::interfaces::CacheStore) implementation.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cache;
pub mod condition;
pub mod resolver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::InMemoryCacheStore;
pub use condition::EqualityPredicate;
pub use condition::evaluate_condition;
pub use condition::evaluate_optional_condition;
pub use condition::parse_condition;
pub use condition::resolve_path;
pub use resolver::evaluate_document;
pub use resolver::resolve;
pub use resolver::resolve_with_reason;
