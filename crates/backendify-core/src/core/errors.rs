// crates/backendify-core/src/core/errors.rs
// ============================================================================
// Module: Backendify Model Errors
// Description: Local model-constraint violations detected before dispatch.
// Purpose: Reject malformed schema and webhook inputs without a network call.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ModelError`] covers constraints the client can check on its own: machine
//! name syntax, display name bounds, webhook URLs, and wire payloads that break
//! the field/relation invariant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a collection or field machine name.
pub const MAX_MACHINE_NAME_LENGTH: usize = 63;
/// Maximum length of a display name.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Model constraint errors.
///
/// # Invariants
/// - Variants are stable for CLI error mapping and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Machine name failed syntax or length checks.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// Offending name.
        name: String,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// Display name failed length checks.
    #[error("invalid display name: {0}")]
    InvalidDisplayName(&'static str),
    /// Field type cannot be used for the requested operation.
    #[error("unsupported field type: {0}")]
    UnsupportedFieldType(String),
    /// Field payload violates the relation/target invariant.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field machine name.
        field: String,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// Webhook definition is invalid.
    #[error("invalid webhook: {0}")]
    InvalidWebhook(String),
    /// Validation rule definition is invalid.
    #[error("invalid validation rule: {0}")]
    InvalidRule(String),
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Validates a machine name against `^[a-z][a-z0-9_]*$` and the length cap.
///
/// # Errors
///
/// Returns [`ModelError::InvalidName`] when the name is empty, too long, or
/// contains characters outside the allowed set.
pub fn validate_machine_name(name: &str) -> Result<(), ModelError> {
    let invalid = |reason| ModelError::InvalidName {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("must be non-empty"));
    }
    if name.len() > MAX_MACHINE_NAME_LENGTH {
        return Err(invalid("exceeds 63 characters"));
    }
    let mut chars = name.chars();
    if !chars.next().is_some_and(|first| first.is_ascii_lowercase()) {
        return Err(invalid("must start with a lowercase letter"));
    }
    if !chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_') {
        return Err(invalid("may only contain lowercase letters, digits, and underscores"));
    }
    Ok(())
}

/// Validates a display name against the length bounds.
///
/// # Errors
///
/// Returns [`ModelError::InvalidDisplayName`] when the trimmed name is empty or
/// longer than [`MAX_DISPLAY_NAME_LENGTH`].
pub fn validate_display_name(display_name: &str) -> Result<(), ModelError> {
    if display_name.trim().is_empty() {
        return Err(ModelError::InvalidDisplayName("must be non-empty"));
    }
    if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(ModelError::InvalidDisplayName("exceeds 255 characters"));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::ModelError;
    use super::validate_display_name;
    use super::validate_machine_name;

    #[test]
    fn machine_names_follow_slug_rules() {
        assert!(validate_machine_name("posts").is_ok());
        assert!(validate_machine_name("post_tags2").is_ok());
        assert!(matches!(validate_machine_name(""), Err(ModelError::InvalidName { .. })));
        assert!(validate_machine_name("2posts").is_err());
        assert!(validate_machine_name("Posts").is_err());
        assert!(validate_machine_name("post-tags").is_err());
        assert!(validate_machine_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn display_names_are_bounded() {
        assert!(validate_display_name("Blog Posts").is_ok());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(256)).is_err());
    }
}
