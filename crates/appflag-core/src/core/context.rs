// crates/appflag-core/src/core/context.rs
// ============================================================================
// Module: appflag Evaluation Context
// Description: Caller-supplied attribute bag used by rule conditions.
// Purpose: Provide an immutable JSON object view for condition evaluation.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An [`EvaluationContext`] maps top-level keys to nested JSON values. It is
//! supplied per evaluation call and never mutated by the evaluation pipeline.
//! Conditions compare string values only, so callers should store attributes
//! used in conditions as strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Evaluation Context
// ============================================================================

/// Caller-supplied evaluation attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext(Map<String, Value>);

impl EvaluationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from an existing JSON object map.
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Creates a context from a JSON value, returning `None` for non-objects.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns a copy of the context with an additional top-level attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the top-level attribute for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the underlying attribute map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns true when no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the context into a JSON object value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}
