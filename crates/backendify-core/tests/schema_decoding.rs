// crates/backendify-core/tests/schema_decoding.rs
// ============================================================================
// Module: Schema Decoding Tests
// Description: Wire decoding of fields, records, and record pages.
// Purpose: Pin the field/relation invariant and the typed record view.
// ============================================================================

//! Schema and record decoding tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use backendify_core::CellValue;
use backendify_core::CollectionId;
use backendify_core::Field;
use backendify_core::FieldKind;
use backendify_core::OnDeleteAction;
use backendify_core::RecordId;
use backendify_core::RecordPage;
use backendify_core::RelationType;
use backendify_core::ReverseRelation;
use backendify_core::ScalarType;
use backendify_core::TypedRecord;
use serde_json::Value;
use serde_json::json;

fn category_field() -> Value {
    json!({
        "id": "f_category",
        "collection_id": "c_posts",
        "name": "category",
        "display_name": "Category",
        "field_type": "relation",
        "sql_column_name": "category_id",
        "is_required": false,
        "relation_target_collection_id": "c_categories",
        "relation_type": "many_to_one",
        "relation_on_delete": "SET NULL",
    })
}

#[test]
fn relation_field_decodes_with_target() {
    let field: Field = serde_json::from_value(category_field()).unwrap();
    let spec = field.relation().expect("relation metadata");
    assert_eq!(spec.target_collection_id, CollectionId::new("c_categories"));
    assert_eq!(spec.relation_type, RelationType::ManyToOne);
    assert_eq!(spec.on_delete, OnDeleteAction::SetNull);
    assert_eq!(field.type_label(), "relation");
}

#[test]
fn relation_without_target_is_rejected() {
    let mut raw = category_field();
    raw.as_object_mut().unwrap().remove("relation_target_collection_id");
    assert!(serde_json::from_value::<Field>(raw).is_err());
}

#[test]
fn scalar_with_target_is_rejected() {
    let raw = json!({
        "id": "f_title",
        "name": "title",
        "display_name": "Title",
        "field_type": "string",
        "relation_target_collection_id": "c_categories",
    });
    assert!(serde_json::from_value::<Field>(raw).is_err());
}

#[test]
fn unknown_field_types_are_preserved() {
    let raw = json!({
        "id": "f_geo",
        "name": "location",
        "display_name": "Location",
        "field_type": "geopoint",
    });
    let field: Field = serde_json::from_value(raw).unwrap();
    assert_eq!(field.kind, FieldKind::Scalar(ScalarType::Unknown("geopoint".to_string())));
    let reencoded = serde_json::to_value(&field).unwrap();
    assert_eq!(reencoded["field_type"], json!("geopoint"));
}

#[test]
fn record_pages_accept_either_list_key() {
    let page: RecordPage =
        serde_json::from_value(json!({"records": [{"id": 1, "title": "a"}], "total": 1})).unwrap();
    assert!(page.contains(&RecordId::Int(1)));
    let page: RecordPage =
        serde_json::from_value(json!({"data": [{"id": "r1"}], "total": 7, "limit": 1, "offset": 0}))
            .unwrap();
    assert_eq!(page.total, 7);
    assert!(page.contains(&RecordId::Text("r1".to_string())));
}

#[test]
fn typed_record_follows_field_order_and_storage_columns() {
    let title: Field = serde_json::from_value(json!({
        "id": "f_title",
        "name": "title",
        "display_name": "Title",
        "field_type": "string",
    }))
    .unwrap();
    let views: Field = serde_json::from_value(json!({
        "id": "f_views",
        "name": "views",
        "display_name": "Views",
        "field_type": "int",
    }))
    .unwrap();
    let category: Field = serde_json::from_value(category_field()).unwrap();
    let fields = vec![category, title, views];
    let record = serde_json::from_value(json!({
        "id": 10,
        "created_at": "2024-01-01T00:00:00Z",
        "title": "Hello",
        "category_id": 3,
        "views": null,
    }))
    .unwrap();

    let typed = TypedRecord::decode(&fields, &record);
    assert_eq!(typed.cells.len(), 3);
    assert_eq!(typed.cells[0].value, CellValue::Reference(RecordId::Int(3)));
    assert_eq!(typed.cells[1].value, CellValue::Text("Hello".to_string()));
    assert!(typed.cells[2].value.is_missing());
}

#[test]
fn reverse_relation_labels_name_the_source() {
    let reverse: ReverseRelation = serde_json::from_value(json!({
        "id": "f_category",
        "name": "category",
        "display_name": "Category",
        "source_collection_id": "c_posts",
        "source_collection_name": "posts",
        "sql_column_name": "category_id",
    }))
    .unwrap();
    assert_eq!(reverse.relation_type, RelationType::OneToMany);
    assert_eq!(reverse.edge_label(), "posts.category");
}
