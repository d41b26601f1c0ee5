// crates/backendify-console/src/telemetry.rs
// ============================================================================
// Module: Console Telemetry
// Description: Structured client events and JSON-lines sinks.
// Purpose: Record cache, mutation, and relation outcomes without payloads.
// Dependencies: backendify-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Console components report what they did as [`ClientEvent`] values: query
//! cache hits and misses, mutation outcomes, invalidations, and degraded
//! relation controls. Events carry labels only. Record values, form input, and
//! webhook secrets never reach a sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use backendify_core::ApiError;
use backendify_core::CacheKey;
use backendify_core::CacheTag;
use backendify_core::MutationKind;
use backendify_core::ProjectId;
use serde::Serialize;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Query cache lookup outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Served from the cache.
    Hit,
    /// Fetched from the remote API.
    Miss,
    /// Fetch failed; any cached entry was evicted.
    Error,
}

impl QueryOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Error => "error",
        }
    }
}

/// Returns a stable label for an API error kind.
#[must_use]
pub const fn api_error_kind(error: &ApiError) -> &'static str {
    match error {
        ApiError::Config(_) => "config",
        ApiError::Transport(_) => "transport",
        ApiError::Status {
            ..
        } => "status",
        ApiError::Decode(_) => "decode",
        ApiError::ResponseTooLarge {
            ..
        } => "response_too_large",
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Structured client event.
///
/// # Invariants
/// - Carries labels and identifiers only, never record values or secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Project scope.
    pub project: String,
    /// Cache key label for query events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Outcome label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    /// Mutation label for mutation events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation: Option<&'static str>,
    /// Invalidated cache tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// API error kind when the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// HTTP status when the API answered with one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Field name for relation events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ClientEvent {
    /// Creates an event with a consistent timestamp and no labels.
    fn base(event: &'static str, project: &ProjectId) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            project: project.to_string(),
            key: None,
            outcome: None,
            mutation: None,
            tags: Vec::new(),
            error_kind: None,
            status: None,
            field: None,
        }
    }

    /// Query cache lookup event.
    #[must_use]
    pub fn query(key: &CacheKey, outcome: QueryOutcome, error: Option<&ApiError>) -> Self {
        let mut event = Self::base("query", &key.project);
        event.key = Some(key.to_string());
        event.outcome = Some(outcome.as_str());
        event.error_kind = error.map(api_error_kind);
        event.status = error.and_then(ApiError::status);
        event
    }

    /// Mutation outcome event.
    #[must_use]
    pub fn mutation(project: &ProjectId, kind: &MutationKind, error: Option<&ApiError>) -> Self {
        let mut event = Self::base("mutation", project);
        event.mutation = Some(kind.label());
        event.outcome = Some(if error.is_some() { "error" } else { "ok" });
        event.error_kind = error.map(api_error_kind);
        event.status = error.and_then(ApiError::status);
        event
    }

    /// Mutation rejected locally before any request was sent.
    #[must_use]
    pub fn mutation_rejected(project: &ProjectId, kind: &MutationKind) -> Self {
        let mut event = Self::base("mutation", project);
        event.mutation = Some(kind.label());
        event.outcome = Some("rejected_locally");
        event
    }

    /// Cache invalidation event.
    #[must_use]
    pub fn invalidation(project: &ProjectId, tags: &[CacheTag]) -> Self {
        let mut event = Self::base("invalidation", project);
        event.tags = tags.iter().map(ToString::to_string).collect();
        event
    }

    /// Relation control degraded to an empty choice list.
    #[must_use]
    pub fn relation_degraded(
        project: &ProjectId,
        field: &str,
        reason: &'static str,
        error: Option<&ApiError>,
    ) -> Self {
        let mut event = Self::base("relation_degraded", project);
        event.field = Some(field.to_string());
        event.outcome = Some(reason);
        event.error_kind = error.map(api_error_kind);
        event.status = error.and_then(ApiError::status);
        event
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for client events.
pub trait ClientEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &ClientEvent);
}

/// Sink that writes JSON lines to stderr.
pub struct StderrEventSink;

impl ClientEventSink for StderrEventSink {
    fn record(&self, event: &ClientEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ClientEventSink for FileEventSink {
    fn record(&self, event: &ClientEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op sink.
pub struct NoopEventSink;

impl ClientEventSink for NoopEventSink {
    fn record(&self, _event: &ClientEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use backendify_core::WebhookId;

    use super::*;

    #[test]
    fn query_event_omits_unset_labels() {
        let key = CacheKey::new(ProjectId::new("p1"), CacheTag::Collections);
        let event = ClientEvent::query(&key, QueryOutcome::Hit, None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "query");
        assert_eq!(json["key"], "p1/collections");
        assert_eq!(json["outcome"], "hit");
        assert!(json.get("error_kind").is_none());
        assert!(json.get("tags").is_none());
    }

    #[test]
    fn failed_mutation_carries_status_but_not_body() {
        let error = ApiError::Status {
            status: 400,
            body: r#"{"detail":{"validation_errors":{"title":["secret-ish"]}}}"#.to_string(),
        };
        let kind = MutationKind::DeleteWebhook {
            webhook: WebhookId::new("wh1"),
        };
        let event = ClientEvent::mutation(&ProjectId::new("p1"), &kind, Some(&error));
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains("\"status\":400"));
        assert!(line.contains("\"error_kind\":\"status\""));
        assert!(!line.contains("secret-ish"));
    }
}
