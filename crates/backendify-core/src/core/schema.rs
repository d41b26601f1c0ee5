// crates/backendify-core/src/core/schema.rs
// ============================================================================
// Module: Backendify Schema Model
// Description: Collections, typed fields, and relation metadata.
// Purpose: Describe the runtime-discovered record shape of a project.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The remote service owns the schema; the client only reads it, plus the
//! creation payloads in this module. A [`Field`] is either a scalar column or
//! a relation edge, modeled as [`FieldKind`] so the relation/target invariant
//! holds by construction: wire payloads that declare a relation without a
//! target, or a scalar with one, fail to decode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::Map;
use serde_json::Value;

use crate::core::errors::ModelError;
use crate::core::errors::validate_display_name;
use crate::core::errors::validate_machine_name;
use crate::core::identifiers::CollectionId;
use crate::core::identifiers::FieldId;

// ============================================================================
// SECTION: Collections
// ============================================================================

/// Collection metadata as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection identifier.
    pub id: CollectionId,
    /// Machine name used in URLs and queries.
    pub name: String,
    /// Human display name.
    pub display_name: String,
    /// Whether the collection is active.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Whether the collection is managed by the service itself.
    #[serde(default)]
    pub is_system: bool,
    /// Creation timestamp as reported by the service.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp as reported by the service.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Collection creation payload.
///
/// # Invariants
/// - `name` satisfies [`validate_machine_name`].
/// - `display_name` satisfies [`validate_display_name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCollection {
    /// Machine name.
    name: String,
    /// Display name.
    display_name: String,
}

impl NewCollection {
    /// Builds a validated collection creation payload.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when either name fails validation.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let display_name = display_name.into();
        validate_machine_name(&name)?;
        validate_display_name(&display_name)?;
        Ok(Self {
            name,
            display_name,
        })
    }

    /// Returns the machine name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

// ============================================================================
// SECTION: Field Types
// ============================================================================

/// Scalar (non-relation) field types.
///
/// # Invariants
/// - Wire names are stable: `string`, `text`, `int`, `float`, `bool`, `date`,
///   `datetime`, `uuid`.
/// - Unrecognized wire names are preserved in [`ScalarType::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Short single-line text.
    String,
    /// Long multi-line text.
    Text,
    /// Integer.
    Int,
    /// Floating-point number.
    Float,
    /// Boolean.
    Bool,
    /// Calendar date.
    Date,
    /// Timestamp.
    DateTime,
    /// UUID string.
    Uuid,
    /// Type name the client does not recognize.
    Unknown(String),
}

impl ScalarType {
    /// Parses a wire type name.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "string" => Self::String,
            "text" => Self::Text,
            "int" | "integer" => Self::Int,
            "float" => Self::Float,
            "bool" | "boolean" => Self::Bool,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "uuid" => Self::Uuid,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the wire type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScalarType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScalarType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// Relation cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Many source records reference one target record.
    #[default]
    ManyToOne,
    /// One source record is referenced by many target records.
    OneToMany,
    /// Many-to-many association.
    ManyToMany,
}

impl RelationType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManyToOne => "many_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToMany => "many_to_many",
        }
    }
}

/// Action the remote service applies to referencing records on target delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OnDeleteAction {
    /// Block deletion while references exist.
    #[default]
    #[serde(rename = "RESTRICT")]
    Restrict,
    /// Delete referencing records.
    #[serde(rename = "CASCADE")]
    Cascade,
    /// Null out the reference.
    #[serde(rename = "SET NULL", alias = "SET_NULL")]
    SetNull,
}

impl OnDeleteAction {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
        }
    }
}

/// Relation metadata carried only by relation fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    /// Target collection identifier.
    pub target_collection_id: CollectionId,
    /// Relation cardinality.
    pub relation_type: RelationType,
    /// On-delete action enforced by the remote service.
    pub on_delete: OnDeleteAction,
    /// Optional target field used as the display label.
    pub display_field: Option<String>,
}

/// Field kind: scalar column or outgoing relation edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Scalar column.
    Scalar(ScalarType),
    /// Relation to another collection.
    Relation(RelationSpec),
}

// ============================================================================
// SECTION: Fields
// ============================================================================

/// Field definition belonging to exactly one collection.
///
/// # Invariants
/// - [`FieldKind::Relation`] always carries a target collection reference.
/// - Scalar fields never carry relation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FieldWire", into = "FieldWire")]
pub struct Field {
    /// Field identifier.
    pub id: FieldId,
    /// Owning collection when reported by the service.
    pub collection_id: Option<CollectionId>,
    /// Machine name.
    pub name: String,
    /// Human display name.
    pub display_name: String,
    /// Scalar or relation kind.
    pub kind: FieldKind,
    /// Storage column name; relation values are keyed by it in record payloads.
    pub sql_column_name: Option<String>,
    /// Whether a value is required on create.
    pub is_required: bool,
    /// Whether values must be unique.
    pub is_unique: bool,
    /// Whether the column is indexed.
    pub is_indexed: bool,
    /// Whether the field is managed by the service.
    pub is_system: bool,
    /// Whether the field is hidden from record payloads.
    pub is_hidden: bool,
    /// Server-side default value.
    pub default_value: Option<String>,
}

impl Field {
    /// Returns true when the field is a relation.
    #[must_use]
    pub const fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation(_))
    }

    /// Returns relation metadata for relation fields.
    #[must_use]
    pub const fn relation(&self) -> Option<&RelationSpec> {
        match &self.kind {
            FieldKind::Relation(spec) => Some(spec),
            FieldKind::Scalar(_) => None,
        }
    }

    /// Returns the wire type label (`relation` for relation fields).
    #[must_use]
    pub fn type_label(&self) -> &str {
        match &self.kind {
            FieldKind::Scalar(scalar) => scalar.as_str(),
            FieldKind::Relation(_) => "relation",
        }
    }

    /// Looks up this field's value in a record payload.
    ///
    /// The storage column is consulted first, then the machine name. JSON
    /// `null` counts as absent.
    #[must_use]
    pub fn value_in<'a>(&self, values: &'a Map<String, Value>) -> Option<&'a Value> {
        self.sql_column_name
            .as_deref()
            .and_then(|column| values.get(column))
            .filter(|value| !value.is_null())
            .or_else(|| values.get(&self.name).filter(|value| !value.is_null()))
    }
}

/// Field shape as sent on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FieldWire {
    /// Field identifier.
    id: FieldId,
    /// Owning collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection_id: Option<CollectionId>,
    /// Machine name.
    name: String,
    /// Display name.
    display_name: String,
    /// Wire type name.
    field_type: String,
    /// Storage column name.
    #[serde(default)]
    sql_column_name: Option<String>,
    /// Required flag.
    #[serde(default)]
    is_required: bool,
    /// Unique flag.
    #[serde(default)]
    is_unique: bool,
    /// Indexed flag.
    #[serde(default)]
    is_indexed: bool,
    /// System flag.
    #[serde(default)]
    is_system: bool,
    /// Hidden flag.
    #[serde(default)]
    is_hidden: bool,
    /// Default value.
    #[serde(default)]
    default_value: Option<String>,
    /// Relation target collection.
    #[serde(default)]
    relation_target_collection_id: Option<CollectionId>,
    /// Relation cardinality.
    #[serde(default)]
    relation_type: Option<RelationType>,
    /// Relation on-delete action.
    #[serde(default)]
    relation_on_delete: Option<OnDeleteAction>,
    /// Relation display field.
    #[serde(default)]
    relation_display_field: Option<String>,
}

impl TryFrom<FieldWire> for Field {
    type Error = ModelError;

    fn try_from(wire: FieldWire) -> Result<Self, Self::Error> {
        let kind = if wire.field_type == "relation" {
            let target = wire.relation_target_collection_id.ok_or_else(|| {
                ModelError::InvalidField {
                    field: wire.name.clone(),
                    reason: "relation field is missing its target collection",
                }
            })?;
            FieldKind::Relation(RelationSpec {
                target_collection_id: target,
                relation_type: wire.relation_type.unwrap_or_default(),
                on_delete: wire.relation_on_delete.unwrap_or_default(),
                display_field: wire.relation_display_field,
            })
        } else {
            if wire.relation_target_collection_id.is_some() {
                return Err(ModelError::InvalidField {
                    field: wire.name,
                    reason: "non-relation field carries a relation target",
                });
            }
            FieldKind::Scalar(ScalarType::from_wire(&wire.field_type))
        };
        Ok(Self {
            id: wire.id,
            collection_id: wire.collection_id,
            name: wire.name,
            display_name: wire.display_name,
            kind,
            sql_column_name: wire.sql_column_name,
            is_required: wire.is_required,
            is_unique: wire.is_unique,
            is_indexed: wire.is_indexed,
            is_system: wire.is_system,
            is_hidden: wire.is_hidden,
            default_value: wire.default_value,
        })
    }
}

impl From<Field> for FieldWire {
    fn from(field: Field) -> Self {
        let field_type = field.type_label().to_string();
        let (target, relation_type, on_delete, display_field) = match field.kind {
            FieldKind::Relation(spec) => (
                Some(spec.target_collection_id),
                Some(spec.relation_type),
                Some(spec.on_delete),
                spec.display_field,
            ),
            FieldKind::Scalar(_) => (None, None, None, None),
        };
        Self {
            id: field.id,
            collection_id: field.collection_id,
            name: field.name,
            display_name: field.display_name,
            field_type,
            sql_column_name: field.sql_column_name,
            is_required: field.is_required,
            is_unique: field.is_unique,
            is_indexed: field.is_indexed,
            is_system: field.is_system,
            is_hidden: field.is_hidden,
            default_value: field.default_value,
            relation_target_collection_id: target,
            relation_type,
            relation_on_delete: on_delete,
            relation_display_field: display_field,
        }
    }
}

/// Scalar field creation payload.
///
/// # Invariants
/// - `field_type` is a known scalar type; relations use [`NewRelationField`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewField {
    /// Machine name.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Scalar type.
    pub field_type: ScalarType,
    /// Required flag.
    pub is_required: bool,
    /// Unique flag.
    pub is_unique: bool,
    /// Indexed flag.
    pub is_indexed: bool,
    /// Server-side default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl NewField {
    /// Builds a validated scalar field creation payload with default flags.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when a name fails validation or the type is not
    /// a known scalar type.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        field_type: ScalarType,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let display_name = display_name.into();
        validate_machine_name(&name)?;
        validate_display_name(&display_name)?;
        if let ScalarType::Unknown(raw) = &field_type {
            return Err(ModelError::UnsupportedFieldType(raw.clone()));
        }
        Ok(Self {
            name,
            display_name,
            field_type,
            is_required: false,
            is_unique: false,
            is_indexed: false,
            default_value: None,
        })
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.is_required = required;
        self
    }
}

/// Relation field creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelationField {
    /// Machine name.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Target collection identifier.
    pub target_collection_id: CollectionId,
    /// Relation cardinality.
    pub relation_type: RelationType,
    /// On-delete action.
    pub on_delete: OnDeleteAction,
    /// Optional display field on the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,
    /// Required flag.
    pub is_required: bool,
}

impl NewRelationField {
    /// Builds a validated relation field payload with default cardinality and
    /// on-delete action.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when a name fails validation.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        target_collection_id: CollectionId,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let display_name = display_name.into();
        validate_machine_name(&name)?;
        validate_display_name(&display_name)?;
        Ok(Self {
            name,
            display_name,
            target_collection_id,
            relation_type: RelationType::default(),
            on_delete: OnDeleteAction::default(),
            display_field: None,
            is_required: false,
        })
    }
}

// ============================================================================
// SECTION: Relations
// ============================================================================

/// Incoming relation edge: a relation field owned by another collection that
/// targets the current one. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseRelation {
    /// Identifier of the owning relation field.
    pub id: FieldId,
    /// Relation field machine name.
    pub name: String,
    /// Relation field display name.
    pub display_name: String,
    /// Collection that owns the relation field.
    pub source_collection_id: CollectionId,
    /// Owning collection name when the service could resolve it.
    #[serde(default)]
    pub source_collection_name: Option<String>,
    /// Cardinality from the target's point of view.
    #[serde(default = "default_reverse_relation_type")]
    pub relation_type: RelationType,
    /// Storage column on the source collection.
    #[serde(default)]
    pub sql_column_name: Option<String>,
}

impl ReverseRelation {
    /// Returns a `source.field` label, falling back to the source id.
    #[must_use]
    pub fn edge_label(&self) -> String {
        let source =
            self.source_collection_name.as_deref().unwrap_or(self.source_collection_id.as_str());
        format!("{source}.{}", self.name)
    }
}

/// Single advertised relation option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationOption {
    /// Wire value.
    pub value: String,
    /// Human label.
    pub label: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Relation types and on-delete actions advertised by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelationOptions {
    /// Supported cardinalities.
    #[serde(default)]
    pub relation_types: Vec<RelationOption>,
    /// Supported on-delete actions.
    #[serde(default)]
    pub on_delete_actions: Vec<RelationOption>,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serde default for boolean flags that default to true.
const fn default_true() -> bool {
    true
}

/// Serde default for reverse relation cardinality.
const fn default_reverse_relation_type() -> RelationType {
    RelationType::OneToMany
}
