//! Form builder and error mapper property-based tests.
//!
//! ## Purpose
//! These tests check the form and mapper contracts over randomized schemas and
//! response bodies, without any service behind them.
//!
//! ## What is covered
//! - One control per field, in field order; relations always map to a select.
//! - Fixing only the errored fields clears exactly their errors.
//! - Structured validation bodies map onto the same field/message pairs.
//! - Unstructured bodies never produce field errors.
// crates/backendify-console/tests/proptest_forms.rs
// ============================================================================
// Module: Form Property-Based Tests
// Description: Randomized checks for form building and error mapping.
// Purpose: Hold the form and mapper contracts across arbitrary inputs.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;

use backendify_console::ControlKind;
use backendify_console::RecordForm;
use backendify_console::SubmitMode;
use backendify_console::apply_server_error;
use backendify_console::build_input_schema;
use backendify_core::ApiError;
use backendify_core::Field;
use proptest::prelude::*;
use serde_json::json;

const FIELD_TYPES: [&str; 8] =
    ["string", "text", "int", "float", "bool", "date", "uuid", "relation"];

fn field(index: usize, type_index: usize, required: bool) -> Field {
    let field_type = FIELD_TYPES[type_index % FIELD_TYPES.len()];
    let mut raw = json!({
        "id": format!("fld_{index}"),
        "name": format!("f{index}"),
        "display_name": format!("Field {index}"),
        "field_type": field_type,
        "is_required": required,
    });
    if field_type == "relation" {
        raw["relation_target_collection_id"] = json!("col_target");
        raw["sql_column_name"] = json!(format!("f{index}_id"));
    }
    serde_json::from_value(raw).unwrap()
}

fn int_field(index: usize) -> Field {
    field(index, 2, false)
}

fn rejection(body: String) -> ApiError {
    ApiError::Status {
        status: 400,
        body,
    }
}

proptest! {
    #[test]
    fn input_schema_has_one_control_per_field_in_order(
        shape in prop::collection::vec((0usize..FIELD_TYPES.len(), any::<bool>()), 0..12)
    ) {
        let fields: Vec<Field> =
            shape
                .iter()
                .enumerate()
                .map(|(index, (kind, required))| field(index, *kind, *required))
                .collect();
        let controls = build_input_schema(&fields);
        prop_assert_eq!(controls.len(), fields.len());
        for (control, field) in controls.iter().zip(&fields) {
            prop_assert_eq!(&control.field, &field.name);
            prop_assert_eq!(control.required, field.is_required);
            prop_assert_eq!(
                matches!(control.kind, ControlKind::RelationSelect { .. }),
                field.is_relation()
            );
        }
    }

    #[test]
    fn fixing_errored_fields_clears_exactly_their_errors(
        valid in prop::collection::vec(any::<bool>(), 1..10),
        fix in prop::collection::vec(any::<bool>(), 10)
    ) {
        let fields: Vec<Field> = (0..valid.len()).map(int_field).collect();
        let mut form = RecordForm::new(&fields);
        for (index, ok) in valid.iter().enumerate() {
            form.set_input(&format!("f{index}"), if *ok { "7" } else { "seven" }).unwrap();
        }
        let first = form.prepare_submission(SubmitMode::Create);
        let errored: Vec<usize> = (0..valid.len()).filter(|index| !valid[*index]).collect();
        prop_assert_eq!(first.is_err(), !errored.is_empty());
        for index in &errored {
            if fix[*index] {
                form.set_input(&format!("f{index}"), "8").unwrap();
            }
        }

        let _ = form.prepare_submission(SubmitMode::Create);

        for index in 0..valid.len() {
            let still_wrong = !valid[index] && !fix[index];
            prop_assert_eq!(form.errors().has_errors(&format!("f{index}")), still_wrong);
        }
    }

    #[test]
    fn structured_bodies_map_field_for_field(
        expected in prop::collection::btree_map(
            "[a-z][a-z0-9_]{0,8}",
            prop::collection::vec("[ -~]{0,24}", 1..4),
            0..6
        )
    ) {
        let body = json!({"detail": {"validation_errors": expected}}).to_string();
        let mapped = apply_server_error(&rejection(body));
        let actual: BTreeMap<String, Vec<String>> =
            mapped.iter().map(|(field, messages)| (field.to_string(), messages.to_vec())).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn unstructured_bodies_map_to_nothing(raw in ".{0,64}") {
        let html = format!("<html>{raw}</html>");
        prop_assert!(apply_server_error(&rejection(html)).is_empty());
        let detail = json!({"detail": raw}).to_string();
        prop_assert!(apply_server_error(&rejection(detail)).is_empty());
    }
}
