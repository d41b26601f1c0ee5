// crates/backendify-core/src/core/record.rs
// ============================================================================
// Module: Backendify Records
// Description: Dynamic records, record pages, list queries, and typed cells.
// Purpose: Represent server-shaped records without static knowledge of their shape.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Record`] is an opaque field-name → JSON scalar map plus its identifier
//! and creation timestamp. [`TypedRecord`] decodes a record against the
//! collection's current field list into one [`CellValue`] per field, indexed
//! in field-list order; the field list stays the authoritative descriptor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::FieldId;
use crate::core::identifiers::RecordId;
use crate::core::schema::Field;
use crate::core::schema::FieldKind;
use crate::core::schema::ScalarType;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Column names managed by the remote service on every record.
pub const SYSTEM_COLUMNS: &[&str] =
    &["id", "created_at", "updated_at", "created_by_user_id", "created_by_app_user_id"];

/// Maximum page size accepted by the remote service.
pub const MAX_PAGE_LIMIT: u32 = 1000;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Record as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record identifier.
    pub id: RecordId,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Remaining column values keyed by column name.
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl Record {
    /// Returns a value by column name, treating JSON `null` as absent.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column).filter(|value| !value.is_null())
    }

    /// Returns this record's value for the given field.
    #[must_use]
    pub fn value_for(&self, field: &Field) -> Option<&Value> {
        field.value_in(&self.values)
    }
}

/// Page of records plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    /// Records on this page.
    #[serde(alias = "data")]
    pub records: Vec<Record>,
    /// Total records matching the query.
    pub total: u64,
    /// Page size applied by the service.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Offset applied by the service.
    #[serde(default)]
    pub offset: Option<u32>,
}

impl RecordPage {
    /// Returns true when a record with the given id is on this page.
    #[must_use]
    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.iter().any(|record| &record.id == id)
    }
}

// ============================================================================
// SECTION: List Queries
// ============================================================================

/// Filter operators understood by the remote list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterOperator {
    /// Equality.
    Eq,
    /// Inequality.
    Neq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Substring match.
    Contains,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
    /// Case-insensitive substring match.
    ILike,
    /// Membership in a comma-separated list.
    In,
    /// Non-membership in a comma-separated list.
    NotIn,
    /// Value is null.
    IsNull,
    /// Value is not null.
    IsNotNull,
}

impl FilterOperator {
    /// Returns the query-string suffix (`field__{suffix}`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::ILike => "ilike",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::IsNull => "isnull",
            Self::IsNotNull => "isnotnull",
        }
    }

    /// Parses a query-string suffix.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let op = match value {
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "contains" => Self::Contains,
            "startswith" => Self::StartsWith,
            "endswith" => Self::EndsWith,
            "ilike" => Self::ILike,
            "in" => Self::In,
            "notin" => Self::NotIn,
            "isnull" => Self::IsNull,
            "isnotnull" => Self::IsNotNull,
            _ => return None,
        };
        Some(op)
    }
}

/// Single list filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordFilter {
    /// Field machine name.
    pub field: String,
    /// Operator.
    pub op: FilterOperator,
    /// Raw value as sent in the query string.
    pub value: String,
}

impl RecordFilter {
    /// Returns the `(key, value)` query pair for this filter.
    #[must_use]
    pub fn query_pair(&self) -> (String, String) {
        let key = match self.op {
            FilterOperator::Eq => self.field.clone(),
            op => format!("{}__{}", self.field, op.as_str()),
        };
        (key, self.value.clone())
    }
}

/// Sort key: field name plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SortKey {
    /// Field machine name.
    pub field: String,
    /// Whether the order is descending.
    pub descending: bool,
}

/// Record list query.
///
/// # Invariants
/// - `limit` is within `1..=MAX_PAGE_LIMIT` once built via [`RecordQuery::page`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordQuery {
    /// Page size.
    pub limit: u32,
    /// Page offset.
    pub offset: u32,
    /// Sort keys in priority order.
    pub sort: Vec<SortKey>,
    /// Filters joined with AND.
    pub filters: Vec<RecordFilter>,
}

impl RecordQuery {
    /// Builds a query for a single page, clamping the limit to the service range.
    #[must_use]
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            offset,
            sort: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(
        mut self,
        field: impl Into<String>,
        op: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        self.filters.push(RecordFilter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Adds a sort key.
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sort.push(SortKey {
            field: field.into(),
            descending,
        });
        self
    }

    /// Returns the full query-string pairs for the list endpoint.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        if !self.sort.is_empty() {
            let sort = self
                .sort
                .iter()
                .map(|key| {
                    if key.descending { format!("-{}", key.field) } else { key.field.clone() }
                })
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("sort".to_string(), sort));
        }
        pairs.extend(self.filters.iter().map(RecordFilter::query_pair));
        pairs
    }
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self::page(100, 0)
    }
}

// ============================================================================
// SECTION: Typed Cells
// ============================================================================

/// Decoded cell value for one field of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No value present.
    Missing,
    /// Text-like value.
    Text(String),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Relation reference to a target record.
    Reference(RecordId),
    /// Value whose JSON type does not match the declared field type.
    Raw(Value),
}

impl CellValue {
    /// Decodes a JSON value according to the field kind.
    #[must_use]
    pub fn decode(kind: &FieldKind, value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::Missing;
        };
        match kind {
            FieldKind::Relation(_) => {
                RecordId::from_json(value).map_or_else(|| Self::Raw(value.clone()), Self::Reference)
            }
            FieldKind::Scalar(ScalarType::Int) => {
                value.as_i64().map_or_else(|| Self::Raw(value.clone()), Self::Int)
            }
            FieldKind::Scalar(ScalarType::Float) => {
                value.as_f64().map_or_else(|| Self::Raw(value.clone()), Self::Float)
            }
            FieldKind::Scalar(ScalarType::Bool) => match value {
                Value::Bool(flag) => Self::Bool(*flag),
                Value::Number(number) if number.as_i64() == Some(0) => Self::Bool(false),
                Value::Number(number) if number.as_i64() == Some(1) => Self::Bool(true),
                other => Self::Raw(other.clone()),
            },
            FieldKind::Scalar(_) => match value {
                Value::String(text) => Self::Text(text.clone()),
                Value::Number(number) => Self::Text(number.to_string()),
                Value::Bool(flag) => Self::Text(flag.to_string()),
                other => Self::Raw(other.clone()),
            },
        }
    }

    /// Returns true when no value is present.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Field identifier this cell belongs to.
    pub field_id: FieldId,
    /// Decoded value.
    pub value: CellValue,
}

/// Record decoded against a field list.
///
/// # Invariants
/// - `cells[i]` corresponds to `fields[i]` of the list used for decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRecord {
    /// Record identifier.
    pub id: RecordId,
    /// Creation timestamp.
    pub created_at: Option<String>,
    /// Cells in field-list order.
    pub cells: Vec<Cell>,
}

impl TypedRecord {
    /// Decodes a record against the given field list.
    #[must_use]
    pub fn decode(fields: &[Field], record: &Record) -> Self {
        let cells = fields
            .iter()
            .map(|field| Cell {
                field_id: field.id.clone(),
                value: CellValue::decode(&field.kind, record.value_for(field)),
            })
            .collect();
        Self {
            id: record.id.clone(),
            created_at: record.created_at.clone(),
            cells,
        }
    }

    /// Returns the cell for a field id.
    #[must_use]
    pub fn cell(&self, field_id: &FieldId) -> Option<&Cell> {
        self.cells.iter().find(|cell| &cell.field_id == field_id)
    }
}
