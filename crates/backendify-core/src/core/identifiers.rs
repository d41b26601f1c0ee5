// crates/backendify-core/src/core/identifiers.rs
// ============================================================================
// Module: Backendify Identifiers
// Description: Canonical opaque identifiers for Backendify projects and schema entities.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! String-based identifiers used throughout the client. Identifiers are opaque
//! and serialize as strings. Record identifiers are the exception: the remote
//! service may hand out integer or string keys, and [`RecordId`] preserves
//! whichever form it received so a selected identifier round-trips unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Generates a transparent string identifier newtype.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id! {
    /// Project (tenant) identifier propagated on every remote call.
    ProjectId
}

string_id! {
    /// Collection identifier assigned by the remote service.
    CollectionId
}

string_id! {
    /// Field identifier assigned by the remote service.
    FieldId
}

string_id! {
    /// Webhook identifier assigned by the remote service.
    WebhookId
}

string_id! {
    /// Webhook delivery identifier assigned by the remote service.
    DeliveryId
}

string_id! {
    /// Validation rule identifier assigned by the remote service.
    RuleId
}

/// Record identifier as issued by the remote service.
///
/// # Invariants
/// - The variant mirrors the JSON type the server used; serialization emits the
///   same JSON type back so submitted references match the stored key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer key (e.g. auto-increment row id).
    Int(i64),
    /// String key (e.g. UUID).
    Text(String),
}

impl RecordId {
    /// Parses a user-supplied identifier, preferring the integer form.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        trimmed.parse::<i64>().map_or_else(|_| Self::Text(trimmed.to_string()), Self::Int)
    }

    /// Returns the identifier as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(value) => serde_json::Value::from(*value),
            Self::Text(value) => serde_json::Value::String(value.clone()),
        }
    }

    /// Converts a JSON scalar into a record identifier when it has a usable shape.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(number) => number.as_i64().map(Self::Int),
            serde_json::Value::String(text) if !text.is_empty() => Some(Self::Text(text.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => value.fmt(f),
            Self::Text(value) => value.fmt(f),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
