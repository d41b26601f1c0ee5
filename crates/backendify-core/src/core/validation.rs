// crates/backendify-core/src/core/validation.rs
// ============================================================================
// Module: Backendify Validation Error Sets
// Description: Per-field violation messages for a single form submission.
// Purpose: Give server-side and locally synthesized violations one shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ValidationErrorSet`] maps field names to ordered violation messages.
//! It mirrors the `detail.validation_errors` payload the remote service
//! returns on rejected writes, so locally detected problems (missing required
//! values, unparsable numbers) flow through the same path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message synthesized for required fields missing at submit time.
pub const REQUIRED_MESSAGE: &str = "This field is required";

// ============================================================================
// SECTION: Validation Error Set
// ============================================================================

/// Field name → ordered violation messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrorSet(BTreeMap<String, Vec<String>>);

impl ValidationErrorSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Appends a message for a field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Returns messages for a field.
    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns true when the field has at least one message.
    #[must_use]
    pub fn has_errors(&self, field: &str) -> bool {
        !self.messages(field).is_empty()
    }

    /// Returns true when no field has messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Returns the names of fields with messages, in name order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter(|(_, messages)| !messages.is_empty()).map(|(name, _)| name.as_str())
    }

    /// Iterates over `(field, messages)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<BTreeMap<String, Vec<String>>> for ValidationErrorSet {
    fn from(value: BTreeMap<String, Vec<String>>) -> Self {
        Self(value)
    }
}

impl FromIterator<(String, Vec<String>)> for ValidationErrorSet {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
