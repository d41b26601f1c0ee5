// crates/backendify-console/src/table.rs
// ============================================================================
// Module: Record Table Renderer
// Description: Typed tabular view of a record page with delete affordances.
// Purpose: Render records as aligned text and gate deletes behind confirmation.
// Dependencies: backendify-core
// ============================================================================

//! ## Overview
//! Columns are `id`, the fields in field order, then `created_at`. Cells are
//! decoded by field type; missing values render as [`MISSING_PLACEHOLDER`].
//!
//! Deleting a row takes two steps. [`RecordTable::request_delete`] returns a
//! [`DeleteRequest`]; only [`DeleteRequest::confirm`] produces the
//! [`ConfirmedDelete`] the coordinator accepts. The row leaves the table only
//! when [`RecordTable::remove_deleted`] is handed proof that the delete
//! succeeded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use backendify_core::CellValue;
use backendify_core::Field;
use backendify_core::RecordId;
use backendify_core::RecordPage;
use backendify_core::TypedRecord;

use crate::mutations::DeletedRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rendered value of a missing cell.
pub const MISSING_PLACEHOLDER: &str = "-";
/// Suffix marking a truncated cell.
const TRUNCATION_MARKER: &str = "...";
/// Gap between rendered columns.
const COLUMN_GAP: &str = "  ";

// ============================================================================
// SECTION: Table
// ============================================================================

/// Table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Column key: `id`, a field name, or `created_at`.
    pub key: String,
    /// Header text.
    pub header: String,
}

/// Rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Record identifier.
    pub id: RecordId,
    /// Rendered cells, one per column.
    pub cells: Vec<String>,
}

/// Rendered record page of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTable {
    /// Collection machine name.
    collection: String,
    /// Columns in display order.
    columns: Vec<TableColumn>,
    /// Rows in page order.
    rows: Vec<TableRow>,
    /// Total records matching the query on the server.
    total: u64,
}

impl RecordTable {
    /// Renders a page of `collection` using its field list.
    #[must_use]
    pub fn render(
        collection: &str,
        fields: &[Field],
        page: &RecordPage,
        max_cell_chars: usize,
    ) -> Self {
        let mut columns = vec![TableColumn {
            key: "id".to_string(),
            header: "id".to_string(),
        }];
        columns.extend(fields.iter().map(|field| TableColumn {
            key: field.name.clone(),
            header: field.display_name.clone(),
        }));
        columns.push(TableColumn {
            key: "created_at".to_string(),
            header: "created_at".to_string(),
        });
        let rows = page
            .records
            .iter()
            .map(|record| {
                let typed = TypedRecord::decode(fields, record);
                let mut cells = Vec::with_capacity(columns.len());
                cells.push(truncate(&typed.id.to_string(), max_cell_chars));
                cells.extend(
                    typed.cells.iter().map(|cell| format_cell(&cell.value, max_cell_chars)),
                );
                cells.push(typed.created_at.as_deref().map_or_else(
                    || MISSING_PLACEHOLDER.to_string(),
                    |at| truncate(at, max_cell_chars),
                ));
                TableRow {
                    id: typed.id,
                    cells,
                }
            })
            .collect();
        Self {
            collection: collection.to_string(),
            columns,
            rows,
            total: page.total,
        }
    }

    /// Returns the collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the columns.
    #[must_use]
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Returns the server-side total.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Starts the delete affordance for a row shown in this table.
    #[must_use]
    pub fn request_delete(&self, id: &RecordId) -> Option<DeleteRequest> {
        self.rows.iter().any(|row| &row.id == id).then(|| DeleteRequest {
            collection: self.collection.clone(),
            id: id.clone(),
        })
    }

    /// Removes a row after its delete succeeded. Returns true when a row was removed.
    pub fn remove_deleted(&mut self, deleted: &DeletedRecord) -> bool {
        if deleted.collection() != self.collection {
            return false;
        }
        let before = self.rows.len();
        self.rows.retain(|row| &row.id != deleted.id());
        let removed = self.rows.len() != before;
        if removed {
            self.total = self.total.saturating_sub(1);
        }
        removed
    }

    /// Renders the table as aligned plain text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> =
            self.columns.iter().map(|column| column.header.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(&row.cells) {
                *width = (*width).max(cell.chars().count());
            }
        }
        let mut out = String::new();
        let headers: Vec<&str> = self.columns.iter().map(|column| column.header.as_str()).collect();
        push_line(&mut out, &headers, &widths);
        let rules: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        push_line(&mut out, &rules.iter().map(String::as_str).collect::<Vec<_>>(), &widths);
        for row in &self.rows {
            push_line(&mut out, &row.cells.iter().map(String::as_str).collect::<Vec<_>>(), &widths);
        }
        out
    }
}

/// Appends one padded line without trailing whitespace.
fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let mut line = String::new();
    for (index, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if index > 0 {
            line.push_str(COLUMN_GAP);
        }
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat_n(' ', pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Renders one decoded cell.
#[must_use]
pub fn format_cell(value: &CellValue, max_chars: usize) -> String {
    match value {
        CellValue::Missing => MISSING_PLACEHOLDER.to_string(),
        CellValue::Text(text) => truncate(text, max_chars),
        CellValue::Int(number) => number.to_string(),
        CellValue::Float(number) => number.to_string(),
        CellValue::Bool(flag) => flag.to_string(),
        CellValue::Reference(id) => truncate(&id.to_string(), max_chars),
        CellValue::Raw(raw) => truncate(&raw.to_string(), max_chars),
    }
}

/// Truncates to `max_chars` characters including the marker.
fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.len());
    let mut out: String = single_line.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

// ============================================================================
// SECTION: Delete Confirmation
// ============================================================================

/// Pending delete of one row; needs confirmation before it can be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    /// Collection machine name.
    collection: String,
    /// Record identifier.
    id: RecordId,
}

impl DeleteRequest {
    /// Creates a delete request for a record outside a rendered table.
    #[must_use]
    pub fn new(collection: impl Into<String>, id: RecordId) -> Self {
        Self {
            collection: collection.into(),
            id,
        }
    }

    /// Returns the collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> &RecordId {
        &self.id
    }

    /// Confirms the delete.
    #[must_use]
    pub fn confirm(self) -> ConfirmedDelete {
        ConfirmedDelete {
            collection: self.collection,
            id: self.id,
        }
    }
}

/// Confirmed delete, accepted by the mutation coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedDelete {
    /// Collection machine name.
    collection: String,
    /// Record identifier.
    id: RecordId,
}

impl ConfirmedDelete {
    /// Returns the collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> &RecordId {
        &self.id
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
