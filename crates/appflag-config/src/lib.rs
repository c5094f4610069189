// crates/appflag-config/src/lib.rs
// ============================================================================
// Module: appflag Config Library
// Description: Canonical provider configuration model and validation.
// Purpose: Single source of truth for appflag.toml semantics.
// Dependencies: appflag-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `appflag-config` defines the configuration a provider is built from. Files
//! are TOML, loaded under strict size and path limits, and validated fail
//! closed before any source is constructed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
