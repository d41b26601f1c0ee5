// crates/backendify-cli/src/args.rs
// ============================================================================
// Module: CLI Argument Parsers
// Description: Parsers for assignments, filters, sorts, rules, and confirmations.
// Purpose: Turn raw command-line strings into typed client inputs.
// Dependencies: backendify-core, serde_json
// ============================================================================

//! ## Overview
//! `--set name=value` assignments keep the raw value; the record form decides
//! how to interpret it for the field's control. Filters follow the service's
//! `field__op=value` convention, with a bare `field=value` meaning equality.
//! Rule config entries read their value as JSON when it parses and as plain
//! text otherwise, so `min=3` is a number and `values=["a","b"]` a list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use backendify_core::FilterOperator;
use backendify_core::RecordQuery;
use backendify_core::RuleType;
use backendify_core::WebhookEvent;
use serde_json::Map;
use serde_json::Value;

use crate::error::CliError;
use crate::error::CliResult;

// ============================================================================
// SECTION: Assignments
// ============================================================================

/// One `name=value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Field machine name.
    pub field: String,
    /// Raw value; may be empty.
    pub value: String,
}

/// Parses a `name=value` assignment.
///
/// # Errors
///
/// Returns [`CliError`] when the `=` is missing or the name is blank.
pub fn parse_assignment(raw: &str) -> CliResult<Assignment> {
    let Some((field, value)) = raw.split_once('=') else {
        return Err(CliError::new(format!("expected name=value, got '{raw}'")));
    };
    let field = field.trim();
    if field.is_empty() {
        return Err(CliError::new(format!("missing field name in '{raw}'")));
    }
    Ok(Assignment {
        field: field.to_string(),
        value: value.to_string(),
    })
}

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Parses `field=value` or `field__op=value` into its parts.
///
/// # Errors
///
/// Returns [`CliError`] when the `=` is missing, the field is blank, or the
/// operator suffix is unknown.
pub fn parse_filter(raw: &str) -> CliResult<(String, FilterOperator, String)> {
    let assignment = parse_assignment(raw)?;
    let (field, op) = match assignment.field.rsplit_once("__") {
        Some((field, suffix)) => {
            let op = FilterOperator::parse(suffix)
                .ok_or_else(|| CliError::new(format!("unknown filter operator '{suffix}'")))?;
            (field.to_string(), op)
        }
        None => (assignment.field, FilterOperator::Eq),
    };
    if field.is_empty() {
        return Err(CliError::new(format!("missing field name in '{raw}'")));
    }
    Ok((field, op, assignment.value))
}

/// Parses `field` or `-field` into a sort key.
///
/// # Errors
///
/// Returns [`CliError`] when the field name is blank.
pub fn parse_sort(raw: &str) -> CliResult<(String, bool)> {
    let (field, descending) =
        raw.strip_prefix('-').map_or((raw, false), |field| (field, true));
    if field.trim().is_empty() {
        return Err(CliError::new(format!("missing sort field in '{raw}'")));
    }
    Ok((field.trim().to_string(), descending))
}

/// Builds a list query from raw command-line pieces.
///
/// # Errors
///
/// Returns [`CliError`] when a sort or filter fails to parse.
pub fn build_query(
    limit: u32,
    offset: u32,
    sorts: &[String],
    filters: &[String],
) -> CliResult<RecordQuery> {
    let mut query = RecordQuery::page(limit, offset);
    for raw in sorts {
        let (field, descending) = parse_sort(raw)?;
        query = query.sort_by(field, descending);
    }
    for raw in filters {
        let (field, op, value) = parse_filter(raw)?;
        query = query.filter(field, op, value);
    }
    Ok(query)
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Parses repeated `key=value` rule config entries into one object.
///
/// # Errors
///
/// Returns [`CliError`] when an entry has no `=` or a blank key.
pub fn parse_config(entries: &[String]) -> CliResult<Map<String, Value>> {
    let mut config = Map::new();
    for raw in entries {
        let assignment = parse_assignment(raw)?;
        let value = serde_json::from_str(assignment.value.trim())
            .unwrap_or_else(|_| Value::String(assignment.value.clone()));
        config.insert(assignment.field, value);
    }
    Ok(config)
}

/// Parses a validation rule type name for clap.
///
/// # Errors
///
/// Returns a message naming the accepted types.
pub fn parse_rule_type(raw: &str) -> Result<RuleType, String> {
    RuleType::parse(raw).ok_or_else(|| {
        let names: Vec<&str> = RuleType::CATALOG.into_iter().map(RuleType::as_str).collect();
        format!("unknown rule type '{raw}' (expected one of {})", names.join(", "))
    })
}

// ============================================================================
// SECTION: Misc
// ============================================================================

/// Parses a webhook event name for clap.
///
/// # Errors
///
/// Returns a message naming the accepted events.
pub fn parse_event(raw: &str) -> Result<WebhookEvent, String> {
    WebhookEvent::parse(raw).ok_or_else(|| {
        format!(
            "unknown event '{raw}' (expected record.created, record.updated, record.deleted, or *)"
        )
    })
}

/// Returns true when a confirmation answer means yes.
#[must_use]
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
