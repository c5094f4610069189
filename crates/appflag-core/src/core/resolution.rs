// crates/appflag-core/src/core/resolution.rs
// ============================================================================
// Module: appflag Resolution Types
// Description: Evaluation results, reasons, and the sidecar wire contract.
// Purpose: Share result shapes between local evaluation, sources, and agents.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Resolution`] is the untyped `{value, reason}` pair produced by rule
//! evaluation and by the sidecar `/evaluate` endpoint. The provider facade
//! converts it into a typed [`ResolutionDetails`]. Results are built fresh per
//! call and never persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::context::EvaluationContext;
use crate::core::target::ConfigurationTarget;

// ============================================================================
// SECTION: Reasons
// ============================================================================

/// Explanation of how a resolved value was derived.
///
/// # Invariants
/// - Wire labels are stable (`TARGETING_MATCH`, `DEFAULT`, `ERROR`, `FLAG_NOT_FOUND`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionReason {
    /// A targeting rule matched, or the facade reported a successful resolution.
    TargetingMatch,
    /// No rule matched and the flag default was used.
    Default,
    /// Evaluation failed and the caller default was returned.
    Error,
    /// The flag key is absent from the document.
    FlagNotFound,
}

impl ResolutionReason {
    /// Returns the stable wire label for the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TargetingMatch => "TARGETING_MATCH",
            Self::Default => "DEFAULT",
            Self::Error => "ERROR",
            Self::FlagNotFound => "FLAG_NOT_FOUND",
        }
    }
}

impl fmt::Display for ResolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Untyped evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Resolved value.
    pub value: Value,
    /// Resolution reason.
    pub reason: ResolutionReason,
}

impl Resolution {
    /// Creates a new resolution.
    #[must_use]
    pub const fn new(value: Value, reason: ResolutionReason) -> Self {
        Self {
            value,
            reason,
        }
    }
}

/// Typed evaluation result returned to callers.
///
/// # Invariants
/// - `error_message` is set only when `reason` is [`ResolutionReason::Error`].
/// - `source_reason` is the precise evaluator reason on success and `None` on error.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionDetails<T> {
    /// Resolved value, or the caller default on failure.
    pub value: T,
    /// Reason reported to the caller.
    pub reason: ResolutionReason,
    /// Failure description for error resolutions.
    pub error_message: Option<String>,
    /// Precise reason reported by the resolver or the delegated source.
    pub source_reason: Option<ResolutionReason>,
}

impl<T> ResolutionDetails<T> {
    /// Creates a successful resolution.
    #[must_use]
    pub const fn success(value: T, source_reason: Option<ResolutionReason>) -> Self {
        Self {
            value,
            reason: ResolutionReason::TargetingMatch,
            error_message: None,
            source_reason,
        }
    }

    /// Creates an error resolution carrying the caller default.
    #[must_use]
    pub fn error(default_value: T, message: impl Into<String>) -> Self {
        Self {
            value: default_value,
            reason: ResolutionReason::Error,
            error_message: Some(message.into()),
            source_reason: None,
        }
    }

    /// Returns true when the resolution fell back because of an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.reason == ResolutionReason::Error
    }
}

// ============================================================================
// SECTION: Sidecar Wire Contract
// ============================================================================

/// Request body for sidecar `POST /evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagEvaluationRequest {
    /// Flag key to evaluate.
    pub flag_key: String,
    /// Application identifier.
    pub application: String,
    /// Environment identifier.
    pub environment: String,
    /// Configuration profile identifier.
    pub configuration_profile: String,
    /// Evaluation context.
    #[serde(default)]
    pub context: EvaluationContext,
    /// Caller default value.
    #[serde(default)]
    pub default_value: Value,
}

impl FlagEvaluationRequest {
    /// Builds a request for the given target and flag.
    #[must_use]
    pub fn new(
        target: &ConfigurationTarget,
        flag_key: impl Into<String>,
        context: EvaluationContext,
        default_value: Value,
    ) -> Self {
        Self {
            flag_key: flag_key.into(),
            application: target.application.clone(),
            environment: target.environment.clone(),
            configuration_profile: target.profile.clone(),
            context,
            default_value,
        }
    }

    /// Returns the configuration target addressed by the request.
    #[must_use]
    pub fn target(&self) -> ConfigurationTarget {
        ConfigurationTarget::new(
            self.application.clone(),
            self.environment.clone(),
            self.configuration_profile.clone(),
        )
    }
}
