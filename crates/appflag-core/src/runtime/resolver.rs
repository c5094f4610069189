// crates/appflag-core/src/runtime/resolver.rs
// ============================================================================
// Module: appflag Flag Rule Resolver
// Description: First-match targeting rule evaluation for flag definitions.
// Purpose: Turn a flag definition and caller context into a value and reason.
// Dependencies: crate::core, crate::runtime::condition, serde_json
// ============================================================================

//! ## Overview
//! Rules are walked in declaration order and the first rule whose condition
//! holds decides the value. Otherwise the flag default applies.
//! Invariants:
//! - Disabled rich flags return the caller default without consulting rules.
//! - "First variant" means the first entry of the variant map in document order.
//! - A matching rule with no value or an empty variant map yields the caller
//!   default rather than falling through to later rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::ConfigurationDocument;
use crate::core::EvaluationContext;
use crate::core::FlagDefinition;
use crate::core::Resolution;
use crate::core::ResolutionReason;
use crate::core::RichFlag;
use crate::core::SimpleFlag;
use crate::runtime::condition::evaluate_optional_condition;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves a flag to a value, discarding the reason.
#[must_use]
pub fn resolve(
    flag: FlagDefinition<'_>,
    context: &EvaluationContext,
    default_value: &Value,
) -> Value {
    resolve_with_reason(flag, context, default_value).value
}

/// Resolves a flag to a value and the reason it was chosen.
#[must_use]
pub fn resolve_with_reason(
    flag: FlagDefinition<'_>,
    context: &EvaluationContext,
    default_value: &Value,
) -> Resolution {
    match flag {
        FlagDefinition::Simple(flag) => resolve_simple(flag, context, default_value),
        FlagDefinition::Rich(flag) => resolve_rich(flag, context, default_value),
    }
}

/// Looks up `flag_key` in the document and resolves it.
///
/// Missing flags resolve to the caller default with [`ResolutionReason::FlagNotFound`].
#[must_use]
pub fn evaluate_document(
    document: &ConfigurationDocument,
    flag_key: &str,
    context: &EvaluationContext,
    default_value: &Value,
) -> Resolution {
    document.flag(flag_key).map_or_else(
        || Resolution::new(default_value.clone(), ResolutionReason::FlagNotFound),
        |flag| resolve_with_reason(flag, context, default_value),
    )
}

// ============================================================================
// SECTION: Schema Variants
// ============================================================================

/// Resolves a simple-schema flag.
fn resolve_simple(
    flag: &SimpleFlag,
    context: &EvaluationContext,
    default_value: &Value,
) -> Resolution {
    for rule in &flag.rules {
        if evaluate_optional_condition(rule.condition.as_deref(), context) {
            let value = rule.value.clone().unwrap_or_else(|| default_value.clone());
            return Resolution::new(value, ResolutionReason::TargetingMatch);
        }
    }
    let value = flag.default.clone().unwrap_or_else(|| default_value.clone());
    Resolution::new(value, ResolutionReason::Default)
}

/// Resolves a rich-schema flag.
fn resolve_rich(
    flag: &RichFlag,
    context: &EvaluationContext,
    default_value: &Value,
) -> Resolution {
    if !flag.is_enabled() {
        return Resolution::new(default_value.clone(), ResolutionReason::Default);
    }
    for rule in &flag.targeting.rules {
        if evaluate_optional_condition(rule.condition.as_deref(), context) {
            let value = first_variant(&rule.variants).unwrap_or(default_value).clone();
            return Resolution::new(value, ResolutionReason::TargetingMatch);
        }
    }
    let value = first_variant(&flag.default_variants).unwrap_or(default_value).clone();
    Resolution::new(value, ResolutionReason::Default)
}

/// Returns the first variant value in declaration order.
fn first_variant(variants: &Map<String, Value>) -> Option<&Value> {
    variants.values().next()
}
