// crates/backendify-console/src/relations.rs
// ============================================================================
// Module: Relation Resolver
// Description: Bounded candidate lists for relation fields.
// Purpose: Turn a relation field into a selectable list of target records.
// Dependencies: backendify-core, crate::{lifetime, queries, registry, telemetry}
// ============================================================================

//! ## Overview
//! [`RelationResolver::resolve`] looks the target collection up in the loaded
//! collection list and only then fetches one bounded page of its records. An
//! unknown target or a failed fetch yields an empty list with a status label
//! instead of an error, so one broken relation never fails a whole form.
//!
//! Previews are display-only. Selecting a candidate submits its raw
//! [`RecordId`].
//!
//! [`RelationResolver::resolve_for_view`] ties a fetch to a view mount and
//! drops candidates that arrive after the view went away.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use backendify_core::ApiError;
use backendify_core::Collection;
use backendify_core::Field;
use backendify_core::Record;
use backendify_core::RecordId;
use backendify_core::RecordQuery;
use backendify_core::SYSTEM_COLUMNS;
use serde_json::Value;

use crate::lifetime::ViewLifetime;
use crate::lifetime::ViewToken;
use crate::session::ConsoleSession;
use crate::telemetry::ClientEvent;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resolution status of a relation control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceStatus {
    /// Target found and candidates fetched.
    Resolved,
    /// Field is not a relation or its target is not in the collection list.
    Unresolved,
    /// Target found but its records could not be fetched.
    Unavailable,
}

impl ChoiceStatus {
    /// Returns the label shown next to a degraded control.
    #[must_use]
    pub const fn label(&self) -> Option<&'static str> {
        match self {
            Self::Resolved => None,
            Self::Unresolved => Some("unresolved relation target"),
            Self::Unavailable => Some("relation choices unavailable"),
        }
    }
}

/// One selectable target record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationCandidate {
    /// Identifier submitted when selected.
    pub id: RecordId,
    /// Display-only preview of the record's values.
    pub preview: String,
}

impl fmt::Display for RelationCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.preview.is_empty() {
            write!(f, "#{}", self.id)
        } else {
            write!(f, "#{}: {}", self.id, self.preview)
        }
    }
}

/// Candidate list for one relation field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationChoices {
    /// Relation field name.
    pub field: String,
    /// Target collection when resolved.
    pub target: Option<Collection>,
    /// Candidates in fetch order.
    pub candidates: Vec<RelationCandidate>,
    /// Resolution status.
    pub status: ChoiceStatus,
}

impl RelationChoices {
    /// Builds an empty choice list with a degraded status.
    fn degraded(field: &Field, target: Option<Collection>, status: ChoiceStatus) -> Self {
        Self {
            field: field.name.clone(),
            target,
            candidates: Vec::new(),
            status,
        }
    }

    /// Returns the candidate with the given identifier.
    #[must_use]
    pub fn find(&self, id: &RecordId) -> Option<&RelationCandidate> {
        self.candidates.iter().find(|candidate| &candidate.id == id)
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Relation resolver for one session.
#[derive(Clone, Copy)]
pub struct RelationResolver<'a> {
    /// Owning session.
    session: &'a ConsoleSession,
}

impl<'a> RelationResolver<'a> {
    /// Creates a resolver over `session`.
    #[must_use]
    pub const fn new(session: &'a ConsoleSession) -> Self {
        Self {
            session,
        }
    }

    /// Resolves the candidate list for `field` against `collections`.
    pub async fn resolve(&self, field: &Field, collections: &[Collection]) -> RelationChoices {
        let session = self.session;
        let target = field.relation().and_then(|spec| {
            collections.iter().find(|collection| collection.id == spec.target_collection_id)
        });
        let Some(target) = target.cloned() else {
            session.record(&ClientEvent::relation_degraded(
                session.project(),
                &field.name,
                "unresolved_target",
                None,
            ));
            return RelationChoices::degraded(field, None, ChoiceStatus::Unresolved);
        };
        let settings = session.settings();
        let query = RecordQuery::page(settings.relation_candidate_limit, 0);
        let page = match session.queries().list_records(&target.name, &query).await {
            Ok(page) => page,
            Err(err) => {
                return self.unavailable(field, target, &err);
            }
        };
        let target_fields = session.registry().list_fields(&target.name).await.ok();
        let candidates = page
            .records
            .iter()
            .map(|record| RelationCandidate {
                id: record.id.clone(),
                preview: build_preview(
                    record,
                    target_fields.as_deref(),
                    settings.preview_values,
                    &settings.preview_separator,
                ),
            })
            .collect();
        RelationChoices {
            field: field.name.clone(),
            target: Some(target),
            candidates,
            status: ChoiceStatus::Resolved,
        }
    }

    /// Resolves `field` for the view mount holding `token`.
    ///
    /// Returns `None` when the view unmounted or remounted before the
    /// candidates arrived.
    pub async fn resolve_for_view(
        &self,
        field: &Field,
        collections: &[Collection],
        view: &ViewLifetime,
        token: ViewToken,
    ) -> Option<RelationChoices> {
        let choices = self.resolve(field, collections).await;
        view.deliver(token, choices)
    }

    /// Resolves every relation field of a collection, one after another.
    pub async fn resolve_all(
        &self,
        fields: &[Field],
        collections: &[Collection],
    ) -> Vec<RelationChoices> {
        let mut choices = Vec::new();
        for field in fields.iter().filter(|field| field.is_relation()) {
            choices.push(self.resolve(field, collections).await);
        }
        choices
    }

    /// Records a failed candidate fetch and degrades the control.
    fn unavailable(&self, field: &Field, target: Collection, err: &ApiError) -> RelationChoices {
        let session = self.session;
        session.record(&ClientEvent::relation_degraded(
            session.project(),
            &field.name,
            "fetch_failed",
            Some(err),
        ));
        RelationChoices::degraded(field, Some(target), ChoiceStatus::Unavailable)
    }
}

// ============================================================================
// SECTION: Preview
// ============================================================================

/// Builds a candidate preview from up to `limit` non-system values.
///
/// Values follow the target's field order when `fields` is known, else the
/// record's key order. Missing and null values are skipped.
#[must_use]
pub fn build_preview(
    record: &Record,
    fields: Option<&[Field]>,
    limit: usize,
    separator: &str,
) -> String {
    let is_shown = |column: &str| !SYSTEM_COLUMNS.contains(&column);
    let values: Vec<String> = match fields {
        Some(fields) => fields
            .iter()
            .filter(|field| !field.is_hidden && is_shown(&field.name))
            .filter_map(|field| record.value_for(field))
            .filter_map(preview_text)
            .take(limit)
            .collect(),
        None => record
            .values
            .iter()
            .filter(|(column, _)| is_shown(column))
            .filter_map(|(_, value)| preview_text(value))
            .take(limit)
            .collect(),
    };
    values.join(separator)
}

/// Renders one preview value; null and nested values are skipped.
fn preview_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
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

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn field(name: &str, field_type: &str) -> Field {
        serde_json::from_value(json!({
            "id": format!("f_{name}"),
            "name": name,
            "display_name": name,
            "field_type": field_type,
        }))
        .unwrap()
    }

    #[test]
    fn preview_follows_field_order_and_skips_system_columns() {
        let row = record(json!({
            "id": 4,
            "created_at": "t1",
            "updated_at": "t2",
            "slug": "news",
            "name": "News",
            "rank": 2,
            "extra": "x"
        }));
        let fields = vec![field("name", "string"), field("rank", "int"), field("slug", "string")];
        assert_eq!(build_preview(&row, Some(&fields), 3, " | "), "News | 2 | news");
        assert_eq!(build_preview(&row, Some(&fields), 1, " | "), "News");
    }

    #[test]
    fn preview_without_fields_uses_key_order_and_skips_nulls() {
        let row = record(json!({"id": "a", "b": null, "a": "first", "c": true}));
        assert_eq!(build_preview(&row, None, 3, ", "), "first, true");
    }

    #[test]
    fn candidate_label_shows_id_and_preview() {
        let candidate = RelationCandidate {
            id: RecordId::Int(3),
            preview: "News".to_string(),
        };
        assert_eq!(candidate.to_string(), "#3: News");
    }
}
