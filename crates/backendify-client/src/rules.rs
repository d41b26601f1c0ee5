// crates/backendify-client/src/rules.rs
// ============================================================================
// Module: Backendify In-Memory Rule Evaluation
// Description: Checks one value against one stored validation rule.
// Purpose: Give the in-memory service the service's rule messages and defaults.
// Dependencies: backendify-core, serde_json, url
// ============================================================================

//! ## Overview
//! [`violation`] returns the message a rule reports for a value, or `None`
//! when the value passes. Null values always pass. A custom `error_message` on
//! the rule replaces the default message. Pattern and date-format rules are
//! stored and listed but not evaluated in process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use backendify_core::RuleType;
use backendify_core::ValidationRule;
use serde_json::Value;
use url::Url;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Minimum length applied when a `min_length` rule has no `min`.
const DEFAULT_MIN_LENGTH: u64 = 0;
/// Maximum length applied when a `max_length` rule has no `max`.
const DEFAULT_MAX_LENGTH: u64 = 255;

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Returns the violation message for `value`, or `None` when it passes.
pub fn violation(rule: &ValidationRule, value: &Value) -> Option<String> {
    if value.is_null() {
        return None;
    }
    let default = default_violation(rule, value)?;
    Some(rule.error_message.clone().unwrap_or(default))
}

/// Evaluates a rule and returns its default message on failure.
fn default_violation(rule: &ValidationRule, value: &Value) -> Option<String> {
    let text = value_text(value);
    match rule.kind()? {
        RuleType::MinLength => {
            let min = config_u64(rule, "min").unwrap_or(DEFAULT_MIN_LENGTH);
            (char_count(&text) < min).then(|| format!("Must be at least {min} characters"))
        }
        RuleType::MaxLength => {
            let max = config_u64(rule, "max").unwrap_or(DEFAULT_MAX_LENGTH);
            (char_count(&text) > max).then(|| format!("Must be at most {max} characters"))
        }
        RuleType::Email => (!is_email(&text)).then(|| "Invalid email format".to_string()),
        RuleType::Url => (!is_http_url(&text)).then(|| "Invalid URL format".to_string()),
        RuleType::Uuid => (!is_uuid(&text)).then(|| "Invalid UUID format".to_string()),
        RuleType::MinValue => {
            let min = config_number(rule, "min");
            let number = value_number(value)?;
            (number < min.0).then(|| format!("Must be at least {}", min.1))
        }
        RuleType::MaxValue => {
            let max = config_number(rule, "max");
            let number = value_number(value)?;
            (number > max.0).then(|| format!("Must be at most {}", max.1))
        }
        RuleType::Range => {
            let min = config_number(rule, "min");
            let max = config_number(rule, "max");
            let number = value_number(value)?;
            (number < min.0 || number > max.0)
                .then(|| format!("Must be between {} and {}", min.1, max.1))
        }
        RuleType::Enum => {
            let allowed = rule.config_value("values").and_then(Value::as_array);
            let allowed = allowed.map_or(&[][..], Vec::as_slice);
            (!allowed.contains(value)).then(|| {
                let names: Vec<String> = allowed.iter().map(value_text).collect();
                format!("Must be one of: {}", names.join(", "))
            })
        }
        RuleType::NotEmpty => text.trim().is_empty().then(|| "Cannot be empty".to_string()),
        RuleType::Regex | RuleType::CustomRegex | RuleType::DateFormat => None,
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a value as the text the rules measure.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Returns a value as a number, parsing numeric strings.
fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Returns the character count as `u64`.
fn char_count(text: &str) -> u64 {
    u64::try_from(text.chars().count()).unwrap_or(u64::MAX)
}

/// Reads a non-negative integer config value.
fn config_u64(rule: &ValidationRule, key: &str) -> Option<u64> {
    rule.config_value(key).and_then(Value::as_u64)
}

/// Reads a numeric config value and its display text, defaulting to zero.
fn config_number(rule: &ValidationRule, key: &str) -> (f64, String) {
    match rule.config_value(key) {
        Some(Value::Number(number)) => (number.as_f64().unwrap_or(0.0), number.to_string()),
        _ => (0.0, "0".to_string()),
    }
}

/// Checks `local@domain.tld` with an alphabetic top-level label of two or more.
fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local.chars().all(|ch| ch.is_ascii_alphanumeric() || "._%+-".contains(ch));
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok =
        !host.is_empty() && host.chars().all(|ch| ch.is_ascii_alphanumeric() || ".-".contains(ch));
    local_ok && host_ok && tld.len() >= 2 && tld.chars().all(|ch| ch.is_ascii_alphabetic())
}

/// Checks for an absolute http(s) URL with a host.
fn is_http_url(text: &str) -> bool {
    !text.chars().any(char::is_whitespace)
        && Url::parse(text).is_ok_and(|url| {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        })
}

/// Checks the 8-4-4-4-12 hex layout, case-insensitively.
fn is_uuid(text: &str) -> bool {
    let groups: Vec<&str> = text.split('-').collect();
    groups.len() == 5
        && groups.iter().zip([8, 4, 4, 4, 12]).all(|(group, len)| {
            group.len() == len && group.chars().all(|ch| ch.is_ascii_hexdigit())
        })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
