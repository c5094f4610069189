// crates/appflag-core/src/core/document.rs
// ============================================================================
// Module: appflag Configuration Documents
// Description: Typed model for fetched flag configuration documents.
// Purpose: Parse JSON documents into exactly one supported flag schema.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A configuration document maps flag keys to flag definitions. Two schema
//! variants exist in practice:
//! - simple: `{"features": {key: {"default": v, "rules": [{"condition", "value"}]}}}`
//! - rich: `{"version": "1.0", "flags": {key: {"state", "defaultVariants", "targeting"}}}`
//!
//! Invariants:
//! - A document uses exactly one schema; documents carrying both or neither
//!   top-level key are rejected.
//! - Variant maps keep declaration order so "first variant" is well defined.
//! - Documents are immutable once parsed and are replaced wholesale on refresh.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Top-level key of the rich schema.
const RICH_SCHEMA_KEY: &str = "flags";
/// Top-level key of the simple schema.
const SIMPLE_SCHEMA_KEY: &str = "features";
/// Flag state value that enables rule evaluation.
pub const FLAG_STATE_ENABLED: &str = "ENABLED";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while parsing configuration documents.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Document bytes are not valid JSON.
    #[error("malformed configuration json: {0}")]
    Json(String),
    /// Document root is not a JSON object.
    #[error("configuration document must be a json object")]
    NotAnObject,
    /// Document carries both schema variants.
    #[error("configuration document mixes `flags` and `features` schemas")]
    MixedSchema,
    /// Document carries neither schema variant.
    #[error("configuration document has neither `flags` nor `features`")]
    UnknownSchema,
    /// Document matches a schema but its content is invalid.
    #[error("invalid configuration document: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Simple Schema
// ============================================================================

/// Flag definition in the simple schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleFlag {
    /// Flag default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Ordered targeting rules.
    #[serde(default)]
    pub rules: Vec<SimpleRule>,
}

/// Targeting rule in the simple schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleRule {
    /// Condition expression; absent means the rule always matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Value returned when the rule matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Document using the simple schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleDocument {
    /// Flags keyed by flag key.
    pub features: BTreeMap<String, SimpleFlag>,
}

// ============================================================================
// SECTION: Rich Schema
// ============================================================================

/// Flag definition in the rich schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichFlag {
    /// Flag state; anything other than `ENABLED` disables the flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Default variants keyed by value type, in declaration order.
    #[serde(default)]
    pub default_variants: Map<String, Value>,
    /// Targeting configuration.
    #[serde(default)]
    pub targeting: Targeting,
}

impl RichFlag {
    /// Returns true when the flag state is exactly `ENABLED`.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.as_deref() == Some(FLAG_STATE_ENABLED)
    }
}

/// Targeting block of a rich flag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Targeting {
    /// Ordered targeting rules.
    #[serde(default)]
    pub rules: Vec<RichRule>,
}

/// Targeting rule in the rich schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichRule {
    /// Condition expression; absent means the rule always matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Variants keyed by value type, in declaration order.
    #[serde(default)]
    pub variants: Map<String, Value>,
}

/// Document using the rich schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichDocument {
    /// Optional document version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Flags keyed by flag key.
    pub flags: BTreeMap<String, RichFlag>,
}

// ============================================================================
// SECTION: Document
// ============================================================================

/// Schema variant used by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSchema {
    /// `features` schema with plain values.
    Simple,
    /// `flags` schema with state and variants.
    Rich,
}

/// Borrowed view of a single flag definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlagDefinition<'a> {
    /// Simple-schema flag.
    Simple(&'a SimpleFlag),
    /// Rich-schema flag.
    Rich(&'a RichFlag),
}

/// Parsed configuration document.
///
/// # Invariants
/// - Exactly one schema variant is present.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationDocument {
    /// Simple-schema document.
    Simple(SimpleDocument),
    /// Rich-schema document.
    Rich(RichDocument),
}

impl ConfigurationDocument {
    /// Parses a document from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the bytes are not JSON or violate the schema.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|err| DocumentError::Json(err.to_string()))?;
        Self::from_value(value)
    }

    /// Parses a document from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the value violates the schema.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(map) = &value else {
            return Err(DocumentError::NotAnObject);
        };
        let rich = map.contains_key(RICH_SCHEMA_KEY);
        let simple = map.contains_key(SIMPLE_SCHEMA_KEY);
        match (rich, simple) {
            (true, true) => Err(DocumentError::MixedSchema),
            (true, false) => serde_json::from_value(value)
                .map(Self::Rich)
                .map_err(|err| DocumentError::Invalid(err.to_string())),
            (false, true) => serde_json::from_value(value)
                .map(Self::Simple)
                .map_err(|err| DocumentError::Invalid(err.to_string())),
            (false, false) => Err(DocumentError::UnknownSchema),
        }
    }

    /// Returns the schema variant of the document.
    #[must_use]
    pub const fn schema(&self) -> DocumentSchema {
        match self {
            Self::Simple(_) => DocumentSchema::Simple,
            Self::Rich(_) => DocumentSchema::Rich,
        }
    }

    /// Looks up a flag definition by key.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<FlagDefinition<'_>> {
        match self {
            Self::Simple(doc) => doc.features.get(key).map(FlagDefinition::Simple),
            Self::Rich(doc) => doc.flags.get(key).map(FlagDefinition::Rich),
        }
    }

    /// Returns all flag keys in sorted order.
    #[must_use]
    pub fn flag_keys(&self) -> Vec<&str> {
        match self {
            Self::Simple(doc) => doc.features.keys().map(String::as_str).collect(),
            Self::Rich(doc) => doc.flags.keys().map(String::as_str).collect(),
        }
    }

    /// Returns the number of flags in the document.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Simple(doc) => doc.features.len(),
            Self::Rich(doc) => doc.flags.len(),
        }
    }

    /// Returns true when the document defines no flags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the document-declared version (rich schema only).
    #[must_use]
    pub fn declared_version(&self) -> Option<&str> {
        match self {
            Self::Simple(_) => None,
            Self::Rich(doc) => doc.version.as_deref(),
        }
    }
}

impl Serialize for ConfigurationDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Simple(doc) => doc.serialize(serializer),
            Self::Rich(doc) => doc.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigurationDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}
