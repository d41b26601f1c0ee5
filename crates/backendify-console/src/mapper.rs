// crates/backendify-console/src/mapper.rs
// ============================================================================
// Module: Validation Error Mapper
// Description: Maps rejected-write bodies onto per-field error sets.
// Purpose: Surface server validation messages next to the fields they name.
// Dependencies: backendify-core, serde_json
// ============================================================================

//! ## Overview
//! Only `{"detail": {"validation_errors": {field: [message, ...]}}}` bodies
//! produce field errors. Anything else maps to an empty set: the mapper fails
//! open and never invents per-field errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use backendify_core::ApiError;
use backendify_core::ValidationErrorSet;
use serde_json::Value;

// ============================================================================
// SECTION: Mapping
// ============================================================================

/// Maps an API error onto a validation error set.
#[must_use]
pub fn apply_server_error(error: &ApiError) -> ValidationErrorSet {
    error.body().map_or_else(ValidationErrorSet::new, parse_validation_body)
}

/// Parses a response body into a validation error set.
///
/// Returns an empty set unless every entry is a list of strings.
#[must_use]
pub fn parse_validation_body(body: &str) -> ValidationErrorSet {
    let Ok(document) = serde_json::from_str::<Value>(body) else {
        return ValidationErrorSet::new();
    };
    let Some(errors) = document
        .get("detail")
        .and_then(|detail| detail.get("validation_errors"))
        .and_then(Value::as_object)
    else {
        return ValidationErrorSet::new();
    };
    let mut mapped = ValidationErrorSet::new();
    for (field, messages) in errors {
        let Some(messages) = messages.as_array() else {
            return ValidationErrorSet::new();
        };
        for message in messages {
            let Some(message) = message.as_str() else {
                return ValidationErrorSet::new();
            };
            mapped.push(field.clone(), message);
        }
    }
    mapped
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn status(body: &str) -> ApiError {
        ApiError::Status {
            status: 400,
            body: body.to_string(),
        }
    }

    #[test]
    fn structured_body_maps_to_fields() {
        let set = apply_server_error(&status(concat!(
            r#"{"detail":{"validation_errors":{"#,
            r#""title":["This field is required","Too short"],"#,
            r#""views":["Must be a whole number"]}}}"#
        )));
        assert_eq!(set.messages("title").len(), 2);
        assert_eq!(set.messages("views"), ["Must be a whole number".to_string()]);
    }

    #[test]
    fn plain_detail_and_garbage_map_to_nothing() {
        assert!(apply_server_error(&status(r#"{"detail":"Collection not found"}"#)).is_empty());
        assert!(apply_server_error(&status("<html>oops</html>")).is_empty());
        let not_a_list = r#"{"detail":{"validation_errors":{"a":"not a list"}}}"#;
        assert!(apply_server_error(&status(not_a_list)).is_empty());
        let not_text = r#"{"detail":{"validation_errors":{"a":[1]}}}"#;
        assert!(apply_server_error(&status(not_text)).is_empty());
        assert!(apply_server_error(&ApiError::Transport("reset".to_string())).is_empty());
    }
}
