// crates/appflag-provider/src/value.rs
// ============================================================================
// Module: appflag Flag Values
// Description: Conversions between JSON flag values and typed results.
// Purpose: Give each typed resolve entry point one strict conversion rule.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Conversions are strict: a JSON value of the wrong kind is a type mismatch
//! and never coerced. Integers are accepted where floats are requested.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Flag Value
// ============================================================================

/// Typed flag value with a strict JSON conversion.
pub trait FlagValue: Sized {
    /// Human-readable kind used in type mismatch messages.
    const KIND: &'static str;

    /// Converts a resolved JSON value, returning `None` on kind mismatch.
    fn from_json(value: &Value) -> Option<Self>;

    /// Converts the value to JSON for wire requests.
    fn to_json(&self) -> Value;
}

impl FlagValue for bool {
    const KIND: &'static str = "boolean";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FlagValue for String {
    const KIND: &'static str = "string";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FlagValue for i64 {
    const KIND: &'static str = "integer";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_i64()
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl FlagValue for f64 {
    const KIND: &'static str = "float";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl FlagValue for Map<String, Value> {
    const KIND: &'static str = "object";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }

    fn to_json(&self) -> Value {
        Value::Object(self.clone())
    }
}
