// crates/backendify-console/src/form.rs
// ============================================================================
// Module: Record Form Builder
// Description: Field-driven input controls and user-entered form state.
// Purpose: Derive one typed control per field and build write payloads.
// Dependencies: backendify-core, serde_json, thiserror, crate::relations
// ============================================================================

//! ## Overview
//! [`build_input_schema`] maps each field to exactly one control, in field
//! order. [`RecordForm`] holds only what the user touched: unset fields stay
//! absent and are never defaulted. [`RecordForm::prepare_submission`] coerces
//! touched values to their field types and checks required fields before any
//! request is made, reporting problems in the same [`ValidationErrorSet`]
//! shape the server uses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use backendify_core::CollectionId;
use backendify_core::Field;
use backendify_core::FieldKind;
use backendify_core::REQUIRED_MESSAGE;
use backendify_core::RecordId;
use backendify_core::ScalarType;
use backendify_core::ValidationErrorSet;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

use crate::relations::RelationCandidate;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Local violation for unparseable integer input.
pub const WHOLE_NUMBER_MESSAGE: &str = "Must be a whole number";
/// Local violation for unparseable decimal input.
pub const NUMBER_MESSAGE: &str = "Must be a number";
/// Local violation for unparseable checkbox input.
pub const BOOLEAN_MESSAGE: &str = "Must be true or false";

// ============================================================================
// SECTION: Controls
// ============================================================================

/// Input control kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    /// Single-line text input.
    Text,
    /// Multi-line text input.
    MultilineText,
    /// Numeric input with integer step.
    Integer,
    /// Numeric input with decimal step.
    Decimal,
    /// Checkbox.
    Checkbox,
    /// Selection over target records.
    RelationSelect {
        /// Target collection.
        target: CollectionId,
    },
}

impl ControlKind {
    /// Returns the control kind for a field.
    #[must_use]
    pub fn for_field(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Relation(spec) => Self::RelationSelect {
                target: spec.target_collection_id.clone(),
            },
            FieldKind::Scalar(ScalarType::Int) => Self::Integer,
            FieldKind::Scalar(ScalarType::Float) => Self::Decimal,
            FieldKind::Scalar(ScalarType::Bool) => Self::Checkbox,
            FieldKind::Scalar(ScalarType::Text) => Self::MultilineText,
            FieldKind::Scalar(_) => Self::Text,
        }
    }

    /// Returns a stable label for the control kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::MultilineText => "multiline",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Checkbox => "checkbox",
            Self::RelationSelect {
                ..
            } => "relation_select",
        }
    }
}

/// Input control for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSpec {
    /// Field machine name; form values are keyed by it.
    pub field: String,
    /// Label shown to the user.
    pub label: String,
    /// Control kind.
    pub kind: ControlKind,
    /// Whether a value is required on create.
    pub required: bool,
}

/// Builds one control per field, in field order.
#[must_use]
pub fn build_input_schema(fields: &[Field]) -> Vec<ControlSpec> {
    fields
        .iter()
        .map(|field| ControlSpec {
            field: field.name.clone(),
            label: field.display_name.clone(),
            kind: ControlKind::for_field(&field.kind),
            required: field.is_required,
        })
        .collect()
}

// ============================================================================
// SECTION: Form State
// ============================================================================

/// User-entered value for one control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// Typed text, coerced on submit.
    Text(String),
    /// Checkbox state.
    Flag(bool),
    /// Selected relation target.
    Choice(RecordId),
}

impl FormValue {
    /// Interprets raw text entered for a control of the given kind.
    #[must_use]
    pub fn from_input(kind: &ControlKind, raw: &str) -> Self {
        match kind {
            ControlKind::Checkbox => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Self::Flag(true),
                "false" | "no" | "0" | "off" => Self::Flag(false),
                _ => Self::Text(raw.to_string()),
            },
            ControlKind::RelationSelect {
                ..
            } if !raw.trim().is_empty() => Self::Choice(RecordId::parse(raw)),
            _ => Self::Text(raw.to_string()),
        }
    }
}

/// Form errors raised by user edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// No control exists for the named field.
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Whether a submission creates or patches a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Full create; required fields must be present.
    Create,
    /// Partial update; only touched fields are checked.
    Update,
}

/// Form state for one record.
///
/// # Invariants
/// - `values` only holds fields the user set.
/// - `errors` belongs to the latest submission only.
#[derive(Debug, Clone)]
pub struct RecordForm {
    /// Controls in field order.
    controls: Vec<ControlSpec>,
    /// User-entered values keyed by field name.
    values: BTreeMap<String, FormValue>,
    /// Violations of the latest submission.
    errors: ValidationErrorSet,
}

impl RecordForm {
    /// Creates an empty form for `fields`.
    #[must_use]
    pub fn new(fields: &[Field]) -> Self {
        Self {
            controls: build_input_schema(fields),
            values: BTreeMap::new(),
            errors: ValidationErrorSet::new(),
        }
    }

    /// Returns the controls in field order.
    #[must_use]
    pub fn controls(&self) -> &[ControlSpec] {
        &self.controls
    }

    /// Returns the control for a field.
    #[must_use]
    pub fn control(&self, field: &str) -> Option<&ControlSpec> {
        self.controls.iter().find(|control| control.field == field)
    }

    /// Returns the control for a field or an unknown-field error.
    fn require_control(&self, field: &str) -> Result<&ControlSpec, FormError> {
        self.control(field).ok_or_else(|| FormError::UnknownField(field.to_string()))
    }

    /// Sets a field value.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] when no control exists for `field`.
    pub fn set(&mut self, field: &str, value: FormValue) -> Result<(), FormError> {
        if self.control(field).is_none() {
            return Err(FormError::UnknownField(field.to_string()));
        }
        self.values.insert(field.to_string(), value);
        Ok(())
    }

    /// Sets a field from raw text, interpreted for its control kind.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] when no control exists for `field`.
    pub fn set_input(&mut self, field: &str, raw: &str) -> Result<(), FormError> {
        let control = self.require_control(field)?;
        let value = FormValue::from_input(&control.kind, raw);
        self.values.insert(field.to_string(), value);
        Ok(())
    }

    /// Sets a relation field from raw text matched against its candidates.
    ///
    /// Text equal to a candidate's identifier selects that candidate as
    /// listed, so a text identifier such as `007` is not read as an integer.
    /// Unmatched text falls back to [`FormValue::from_input`].
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] when no control exists for `field`.
    pub fn set_choice_input(
        &mut self,
        field: &str,
        raw: &str,
        candidates: &[RelationCandidate],
    ) -> Result<(), FormError> {
        let control = self.require_control(field)?;
        let trimmed = raw.trim();
        let matched = match control.kind {
            ControlKind::RelationSelect {
                ..
            } => candidates.iter().find(|candidate| candidate.id.to_string() == trimmed),
            _ => None,
        };
        let value = matched.map_or_else(
            || FormValue::from_input(&control.kind, raw),
            |candidate| FormValue::Choice(candidate.id.clone()),
        );
        self.values.insert(field.to_string(), value);
        Ok(())
    }

    /// Clears a field back to absent.
    pub fn clear(&mut self, field: &str) {
        self.values.remove(field);
    }

    /// Returns the value entered for a field.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&FormValue> {
        self.values.get(field)
    }

    /// Returns the violations of the latest submission.
    #[must_use]
    pub const fn errors(&self) -> &ValidationErrorSet {
        &self.errors
    }

    /// Replaces the error state with a server-mapped set.
    pub fn apply_errors(&mut self, errors: ValidationErrorSet) {
        self.errors = errors;
    }

    /// Clears the error state after a successful write.
    pub fn submission_succeeded(&mut self) {
        self.errors.clear();
    }

    /// Starts a submission and builds the write payload.
    ///
    /// Clears previous errors first. Only touched fields reach the payload.
    ///
    /// # Errors
    ///
    /// Returns the local violations, which are also stored on the form.
    pub fn prepare_submission(
        &mut self,
        mode: SubmitMode,
    ) -> Result<Map<String, Value>, ValidationErrorSet> {
        self.errors.clear();
        let mut payload = Map::new();
        let mut errors = ValidationErrorSet::new();
        for control in &self.controls {
            match self.values.get(&control.field).map(|value| coerce(&control.kind, value)) {
                Some(Ok(Some(value))) => {
                    payload.insert(control.field.clone(), value);
                }
                Some(Err(message)) => errors.push(control.field.clone(), message),
                Some(Ok(None)) | None => {
                    let touched = self.values.contains_key(&control.field);
                    if control.required && (mode == SubmitMode::Create || touched) {
                        errors.push(control.field.clone(), REQUIRED_MESSAGE);
                    }
                }
            }
        }
        if errors.is_empty() {
            Ok(payload)
        } else {
            self.errors = errors.clone();
            Err(errors)
        }
    }
}

/// Coerces a form value to the JSON its control submits.
///
/// Returns `Ok(None)` when the value is blank and should be treated as absent.
fn coerce(kind: &ControlKind, value: &FormValue) -> Result<Option<Value>, &'static str> {
    match (kind, value) {
        (_, FormValue::Text(text)) if text.trim().is_empty() => Ok(None),
        (ControlKind::Integer, FormValue::Text(text)) => {
            text.trim()
                .parse::<i64>()
                .map(|number| Some(Value::from(number)))
                .map_err(|_| WHOLE_NUMBER_MESSAGE)
        }
        (ControlKind::Integer, _) => Err(WHOLE_NUMBER_MESSAGE),
        (ControlKind::Decimal, FormValue::Text(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(|number| Some(Value::Number(number)))
            .ok_or(NUMBER_MESSAGE),
        (ControlKind::Decimal, _) => Err(NUMBER_MESSAGE),
        (ControlKind::Checkbox, FormValue::Flag(flag)) => Ok(Some(Value::Bool(*flag))),
        (ControlKind::Checkbox, _) => Err(BOOLEAN_MESSAGE),
        (
            ControlKind::RelationSelect {
                ..
            },
            FormValue::Choice(id),
        ) => Ok(Some(id.to_json())),
        (
            ControlKind::RelationSelect {
                ..
            },
            FormValue::Text(text),
        ) => Ok(Some(RecordId::parse(text).to_json())),
        (
            ControlKind::RelationSelect {
                ..
            },
            FormValue::Flag(_),
        ) => Err("Must be a record identifier"),
        (ControlKind::Text | ControlKind::MultilineText, FormValue::Text(text)) => {
            Ok(Some(Value::String(text.clone())))
        }
        (ControlKind::Text | ControlKind::MultilineText, FormValue::Flag(flag)) => {
            Ok(Some(Value::String(flag.to_string())))
        }
        (ControlKind::Text | ControlKind::MultilineText, FormValue::Choice(id)) => {
            Ok(Some(Value::String(id.to_string())))
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use serde_json::json;

    use super::*;

    fn field(value: serde_json::Value) -> Field {
        serde_json::from_value(value).unwrap()
    }

    fn scalar(id: &str, name: &str, field_type: &str) -> Field {
        field(json!({"id": id, "name": name, "display_name": name, "field_type": field_type}))
    }

    fn post_fields() -> Vec<Field> {
        vec![
            field(json!({
                "id": "f1", "name": "title", "display_name": "Title", "field_type": "string",
                "is_required": true
            })),
            scalar("f2", "body", "text"),
            scalar("f3", "views", "int"),
            scalar("f4", "score", "float"),
            scalar("f5", "live", "bool"),
            field(json!({
                "id": "f6", "name": "category", "display_name": "Category",
                "field_type": "relation", "relation_target_collection_id": "c1",
                "sql_column_name": "category_id"
            })),
            scalar("f7", "published", "date"),
        ]
    }

    #[test]
    fn each_field_type_gets_its_control() {
        let kinds: Vec<ControlKind> =
            build_input_schema(&post_fields()).into_iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ControlKind::Text,
                ControlKind::MultilineText,
                ControlKind::Integer,
                ControlKind::Decimal,
                ControlKind::Checkbox,
                ControlKind::RelationSelect {
                    target: CollectionId::new("c1")
                },
                ControlKind::Text,
            ]
        );
    }

    #[test]
    fn payload_contains_only_touched_fields() {
        let mut form = RecordForm::new(&post_fields());
        form.set("title", FormValue::Text("Hello".to_string())).unwrap();
        form.set_input("views", " 12 ").unwrap();
        form.set_input("live", "yes").unwrap();
        form.set_input("category", "3").unwrap();

        let payload = form.prepare_submission(SubmitMode::Create).unwrap();

        assert_eq!(
            Value::Object(payload),
            json!({"title": "Hello", "views": 12, "live": true, "category": 3})
        );
    }

    #[test]
    fn local_violations_use_server_shape() {
        let mut form = RecordForm::new(&post_fields());
        form.set_input("views", "twelve").unwrap();
        form.set_input("score", "1.5x").unwrap();
        form.set_input("live", "maybe").unwrap();

        let errors = form.prepare_submission(SubmitMode::Create).unwrap_err();

        assert_eq!(errors.messages("title"), [REQUIRED_MESSAGE.to_string()]);
        assert_eq!(errors.messages("views"), [WHOLE_NUMBER_MESSAGE.to_string()]);
        assert_eq!(errors.messages("score"), [NUMBER_MESSAGE.to_string()]);
        assert_eq!(errors.messages("live"), [BOOLEAN_MESSAGE.to_string()]);
        assert_eq!(form.errors(), &errors);
    }

    #[test]
    fn cleared_field_is_absent_again() {
        let mut form = RecordForm::new(&post_fields());
        form.set_input("title", "x").unwrap();
        form.set_input("views", "3").unwrap();
        form.clear("views");

        let payload = form.prepare_submission(SubmitMode::Create).unwrap();

        assert!(!payload.contains_key("views"));
        assert!(form.value("views").is_none());
    }

    #[test]
    fn update_mode_only_checks_touched_required_fields() {
        let mut form = RecordForm::new(&post_fields());
        form.set_input("views", "4").unwrap();
        let payload = form.prepare_submission(SubmitMode::Update).unwrap();
        assert_eq!(Value::Object(payload), json!({"views": 4}));

        form.set_input("title", "  ").unwrap();
        let errors = form.prepare_submission(SubmitMode::Update).unwrap_err();
        assert!(errors.has_errors("title"));
    }

    #[test]
    fn relation_input_keeps_the_listed_identifier() {
        let mut form = RecordForm::new(&post_fields());
        let candidates = [
            RelationCandidate {
                id: RecordId::Text("007".to_string()),
                preview: "Bond".to_string(),
            },
            RelationCandidate {
                id: RecordId::Int(7),
                preview: "Seven".to_string(),
            },
        ];

        form.set_choice_input("category", " 007 ", &candidates).unwrap();
        let agent = FormValue::Choice(RecordId::Text("007".to_string()));
        assert_eq!(form.value("category"), Some(&agent));

        form.set_choice_input("category", "7", &candidates).unwrap();
        assert_eq!(form.value("category"), Some(&FormValue::Choice(RecordId::Int(7))));

        form.set_choice_input("category", "42", &candidates).unwrap();
        assert_eq!(form.value("category"), Some(&FormValue::Choice(RecordId::Int(42))));

        form.set_choice_input("views", "007", &candidates).unwrap();
        assert_eq!(form.value("views"), Some(&FormValue::Text("007".to_string())));
    }

    #[test]
    fn unknown_field_is_refused() {
        let mut form = RecordForm::new(&post_fields());
        assert_eq!(form.set_input("nope", "1"), Err(FormError::UnknownField("nope".to_string())));
    }
}
