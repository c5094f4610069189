// crates/appflag-core/src/runtime/condition.rs
// ============================================================================
// Module: appflag Condition Evaluator
// Description: Single-predicate condition matching against evaluation contexts.
// Purpose: Decide whether a targeting rule applies to a caller context.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! Conditions use one grammar only: `<dotted.path> == "<literal>"` (single
//! quotes are accepted too) with arbitrary whitespace around `==`.
//! Invariants:
//! - Anything outside the grammar evaluates to `false`; it is never an error.
//! - Missing paths and non-object intermediates resolve to nothing, which
//!   never equals a literal.
//! - Comparison is exact string equality with no type coercion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::EvaluationContext;

// ============================================================================
// SECTION: Predicate
// ============================================================================

/// Parsed `path == literal` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqualityPredicate<'a> {
    /// Dotted context path.
    pub path: &'a str,
    /// Expected string literal without quotes.
    pub literal: &'a str,
}

/// Parses a condition string into an equality predicate.
#[must_use]
pub fn parse_condition(condition: &str) -> Option<EqualityPredicate<'_>> {
    let (lhs, rhs) = condition.split_once("==")?;
    let path = lhs.trim();
    if !is_valid_path(path) {
        return None;
    }
    let literal = parse_quoted_literal(rhs.trim())?;
    Some(EqualityPredicate {
        path,
        literal,
    })
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates a condition string against the context.
#[must_use]
pub fn evaluate_condition(condition: &str, context: &EvaluationContext) -> bool {
    let Some(predicate) = parse_condition(condition) else {
        return false;
    };
    matches!(
        resolve_path(context, predicate.path),
        Some(Value::String(actual)) if actual == predicate.literal
    )
}

/// Evaluates an optional condition; an absent condition always matches.
#[must_use]
pub fn evaluate_optional_condition(condition: Option<&str>, context: &EvaluationContext) -> bool {
    condition.is_none_or(|condition| evaluate_condition(condition, context))
}

/// Resolves a dotted path by walking nested objects in the context.
#[must_use]
pub fn resolve_path<'a>(context: &'a EvaluationContext, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = context.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when every dot-separated segment is a non-empty identifier.
fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty()
                && segment.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        })
}

/// Strips matching single or double quotes from a literal.
fn parse_quoted_literal(raw: &str) -> Option<&str> {
    let quote = raw.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let inner = raw.strip_prefix(quote)?.strip_suffix(quote)?;
    if inner.contains(quote) {
        return None;
    }
    Some(inner)
}
