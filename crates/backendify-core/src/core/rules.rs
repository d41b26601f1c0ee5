// crates/backendify-core/src/core/rules.rs
// ============================================================================
// Module: Backendify Validation Rules
// Description: Field validation rules, the rule-type catalog, and dry-run results.
// Purpose: Model rule reads and writes with config checked before any request.
// Dependencies: serde, serde_json, crate::core::{errors, identifiers, schema, validation}
// ============================================================================

//! ## Overview
//! The remote service attaches validation rules to scalar fields and enforces
//! them on every record write. [`RuleType`] is the fixed catalog of rule kinds
//! with the field types each applies to and the config keys each accepts.
//! [`NewValidationRule`] is checked against that catalog locally; reads use
//! [`ValidationRule`], which keeps the rule type as received so a rule kind
//! added by a newer service still lists.
//!
//! [`RecordValidation`] is the dry-run result. Its errors share the
//! [`ValidationErrorSet`] shape with rejected writes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::errors::ModelError;
use crate::core::identifiers::FieldId;
use crate::core::identifiers::RuleId;
use crate::core::schema::Field;
use crate::core::schema::FieldKind;
use crate::core::validation::ValidationErrorSet;

// ============================================================================
// SECTION: Rule Catalog
// ============================================================================

/// Expected JSON shape of one rule config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// Whole number.
    Int,
    /// Any number.
    Number,
    /// String.
    Text,
    /// Array of scalars.
    List,
}

impl ConfigKind {
    /// Returns the catalog label for this shape.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Number => "number",
            Self::Text => "str",
            Self::List => "list",
        }
    }

    /// Returns true when `value` has this shape.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Text => value.is_string(),
            Self::List => value.is_array(),
        }
    }
}

/// Validation rule kinds the service knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Minimum text length.
    MinLength,
    /// Maximum text length.
    MaxLength,
    /// Pattern match.
    Regex,
    /// Email address shape.
    Email,
    /// http(s) URL shape.
    Url,
    /// Minimum number.
    MinValue,
    /// Maximum number.
    MaxValue,
    /// Inclusive number range.
    Range,
    /// Value from a fixed list.
    Enum,
    /// Non-blank text.
    NotEmpty,
    /// UUID shape.
    Uuid,
    /// Date text in a given format.
    DateFormat,
    /// Pattern match with flags.
    CustomRegex,
}

impl RuleType {
    /// Full catalog in service order.
    pub const CATALOG: [Self; 13] = [
        Self::MinLength,
        Self::MaxLength,
        Self::Regex,
        Self::Email,
        Self::Url,
        Self::MinValue,
        Self::MaxValue,
        Self::Range,
        Self::Enum,
        Self::NotEmpty,
        Self::Uuid,
        Self::DateFormat,
        Self::CustomRegex,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Regex => "regex",
            Self::Email => "email",
            Self::Url => "url",
            Self::MinValue => "min_value",
            Self::MaxValue => "max_value",
            Self::Range => "range",
            Self::Enum => "enum",
            Self::NotEmpty => "not_empty",
            Self::Uuid => "uuid",
            Self::DateFormat => "date_format",
            Self::CustomRegex => "custom_regex",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::CATALOG.into_iter().find(|rule| rule.as_str() == value)
    }

    /// Returns the wire field types this rule applies to.
    #[must_use]
    pub const fn applies_to(self) -> &'static [&'static str] {
        match self {
            Self::MinValue | Self::MaxValue | Self::Range => &["int", "float"],
            Self::Enum => &["string", "int"],
            Self::MinLength
            | Self::MaxLength
            | Self::Regex
            | Self::Email
            | Self::Url
            | Self::NotEmpty
            | Self::Uuid
            | Self::DateFormat
            | Self::CustomRegex => &["string"],
        }
    }

    /// Returns true when this rule can be attached to `field`.
    #[must_use]
    pub fn applies_to_field(self, field: &Field) -> bool {
        match &field.kind {
            FieldKind::Scalar(scalar) => {
                self.applies_to().iter().any(|name| *name == scalar.as_str())
            }
            FieldKind::Relation(_) => false,
        }
    }

    /// Returns the config keys this rule accepts and their shapes.
    #[must_use]
    pub const fn config_schema(self) -> &'static [(&'static str, ConfigKind)] {
        match self {
            Self::MinLength => &[("min", ConfigKind::Int)],
            Self::MaxLength => &[("max", ConfigKind::Int)],
            Self::Regex => &[("pattern", ConfigKind::Text)],
            Self::MinValue => &[("min", ConfigKind::Number)],
            Self::MaxValue => &[("max", ConfigKind::Number)],
            Self::Range => &[("min", ConfigKind::Number), ("max", ConfigKind::Number)],
            Self::Enum => &[("values", ConfigKind::List)],
            Self::DateFormat => &[("format", ConfigKind::Text)],
            Self::CustomRegex => &[("pattern", ConfigKind::Text), ("flags", ConfigKind::Text)],
            Self::Email | Self::Url | Self::NotEmpty | Self::Uuid => &[],
        }
    }

    /// Checks a config object against [`Self::config_schema`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRule`] for unknown keys or mistyped values.
    pub fn check_config(self, config: &Map<String, Value>) -> Result<(), ModelError> {
        let schema = self.config_schema();
        for (key, value) in config {
            let Some((_, kind)) = schema.iter().find(|(name, _)| name == key) else {
                return Err(ModelError::InvalidRule(format!(
                    "{} does not accept config key '{key}'",
                    self.as_str()
                )));
            };
            if !kind.accepts(value) {
                return Err(ModelError::InvalidRule(format!(
                    "{}.{key} must be {}",
                    self.as_str(),
                    kind.as_str()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule-type catalog entry as advertised by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTypeInfo {
    /// Rule type wire name.
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Wire field types the rule applies to.
    #[serde(default)]
    pub applies_to: Vec<String>,
    /// Config key to shape label.
    #[serde(default)]
    pub config_schema: Map<String, Value>,
}

impl RuleTypeInfo {
    /// Builds the catalog entry for a known rule type.
    #[must_use]
    pub fn from_rule_type(rule: RuleType) -> Self {
        Self {
            rule_type: rule.as_str().to_string(),
            applies_to: rule.applies_to().iter().map(|name| (*name).to_string()).collect(),
            config_schema: rule
                .config_schema()
                .iter()
                .map(|(key, kind)| ((*key).to_string(), Value::from(kind.as_str())))
                .collect(),
        }
    }
}

/// Envelope of the rule-type catalog response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTypeCatalog {
    /// Advertised rule types.
    pub rule_types: Vec<RuleTypeInfo>,
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Validation rule as returned by every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Rule identifier.
    pub id: RuleId,
    /// Field the rule is attached to.
    pub field_id: FieldId,
    /// Rule type wire name.
    pub rule_type: String,
    /// Rule parameters.
    #[serde(default)]
    pub config: Option<Map<String, Value>>,
    /// Message reported instead of the default one.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Evaluation order, lowest first.
    #[serde(default)]
    pub priority: i64,
    /// Whether the rule is enforced.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ValidationRule {
    /// Returns the rule type when it is in the catalog.
    #[must_use]
    pub fn kind(&self) -> Option<RuleType> {
        RuleType::parse(&self.rule_type)
    }

    /// Returns a config value by key.
    #[must_use]
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.as_ref().and_then(|config| config.get(key))
    }
}

/// Validation rule creation payload.
///
/// # Invariants
/// - `config` only holds keys the rule type accepts, with matching shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewValidationRule {
    /// Rule kind.
    rule_type: RuleType,
    /// Rule parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<Map<String, Value>>,
    /// Custom violation message.
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    /// Evaluation order.
    priority: i64,
}

impl NewValidationRule {
    /// Builds a rule payload with no config.
    #[must_use]
    pub const fn new(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            config: None,
            error_message: None,
            priority: 0,
        }
    }

    /// Sets the rule config after checking it against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRule`] for unknown keys or mistyped values.
    pub fn with_config(mut self, config: Map<String, Value>) -> Result<Self, ModelError> {
        self.rule_type.check_config(&config)?;
        self.config = if config.is_empty() { None } else { Some(config) };
        Ok(self)
    }

    /// Sets the custom violation message; blank messages are dropped.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.error_message = if message.trim().is_empty() { None } else { Some(message) };
        self
    }

    /// Sets the evaluation order.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the rule kind.
    #[must_use]
    pub const fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    /// Returns the rule config.
    #[must_use]
    pub const fn config(&self) -> Option<&Map<String, Value>> {
        self.config.as_ref()
    }

    /// Returns the custom violation message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the evaluation order.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.priority
    }
}

/// Partial update of a validation rule. Unset members are left unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RulePatch {
    /// Replacement config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    /// Replacement message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Replacement evaluation order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    /// Enables or disables the rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl RulePatch {
    /// Returns true when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.config.is_none()
            && self.error_message.is_none()
            && self.priority.is_none()
            && self.is_active.is_none()
    }
}

// ============================================================================
// SECTION: Dry Run
// ============================================================================

/// Result of validating a record payload without writing it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordValidation {
    /// True when no rule was violated.
    pub is_valid: bool,
    /// Violations per field name.
    #[serde(default)]
    pub errors: ValidationErrorSet,
}

/// Serde default for `is_active`.
const fn default_active() -> bool {
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================
