// crates/backendify-core/src/core/webhook.rs
// ============================================================================
// Module: Backendify Webhooks
// Description: Webhook subscriptions, delivery log entries, and one-time secrets.
// Purpose: Model webhook reads without ever carrying the signing secret.
// Dependencies: serde, url
// ============================================================================

//! ## Overview
//! [`Webhook`] is the shape of every webhook read and has no secret field.
//! The signing secret exists only inside [`WebhookCreated`], the result of the
//! creating call. [`WebhookSecret`] is deliberately not `Serialize` and
//! redacts itself in `Debug`, so it cannot reach a cache, a log, or a file
//! through the usual serialization paths.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::core::errors::ModelError;
use crate::core::identifiers::DeliveryId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::WebhookId;

// ============================================================================
// SECTION: Event Catalog
// ============================================================================

/// Webhook event names from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WebhookEvent {
    /// A record was created.
    #[serde(rename = "record.created")]
    RecordCreated,
    /// A record was updated.
    #[serde(rename = "record.updated")]
    RecordUpdated,
    /// A record was deleted.
    #[serde(rename = "record.deleted")]
    RecordDeleted,
    /// Every event.
    #[serde(rename = "*")]
    All,
}

impl WebhookEvent {
    /// Full event catalog in display order.
    pub const CATALOG: [Self; 4] =
        [Self::RecordCreated, Self::RecordUpdated, Self::RecordDeleted, Self::All];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecordCreated => "record.created",
            Self::RecordUpdated => "record.updated",
            Self::RecordDeleted => "record.deleted",
            Self::All => "*",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::CATALOG.into_iter().find(|event| event.as_str() == value)
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event name on a webhook read.
///
/// Reads keep names outside the catalog instead of failing, so one webhook
/// subscribed to a newer event does not hide the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubscribedEvent {
    /// Catalog event.
    Known(WebhookEvent),
    /// Event name this client does not know.
    Other(String),
}

impl SubscribedEvent {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(event) => event.as_str(),
            Self::Other(name) => name,
        }
    }

    /// Returns true when a subscription to this event covers `event`.
    #[must_use]
    pub fn covers(&self, event: WebhookEvent) -> bool {
        matches!(self, Self::Known(known) if *known == event || *known == WebhookEvent::All)
    }
}

impl From<WebhookEvent> for SubscribedEvent {
    fn from(event: WebhookEvent) -> Self {
        Self::Known(event)
    }
}

impl fmt::Display for SubscribedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Webhooks
// ============================================================================

/// Webhook subscription as returned by every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    /// Webhook identifier.
    pub id: WebhookId,
    /// Owning project when reported.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Display name.
    pub name: String,
    /// Delivery URL.
    pub url: String,
    /// Subscribed events, including names outside the catalog.
    pub events: Vec<SubscribedEvent>,
    /// Whether deliveries are enabled.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One-time webhook signing secret.
///
/// # Invariants
/// - Never serialized, cached, or logged; `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    /// Wraps a secret string.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the secret for one-time display.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

/// Result of a webhook creation call: the webhook plus its one-time secret.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookCreated {
    /// Created webhook (secret-free read shape).
    #[serde(flatten)]
    pub webhook: Webhook,
    /// Signing secret, revealed only here.
    pub secret: WebhookSecret,
}

/// Webhook creation payload.
///
/// # Invariants
/// - `url` parses as an absolute `http` or `https` URL.
/// - `events` is non-empty and free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewWebhook {
    /// Display name.
    name: String,
    /// Delivery URL.
    url: String,
    /// Subscribed events.
    events: Vec<WebhookEvent>,
}

impl NewWebhook {
    /// Builds a validated webhook creation payload.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidWebhook`] when the name is blank, the URL is
    /// not http(s), or no events are selected.
    pub fn new(
        name: impl Into<String>,
        url: &str,
        events: impl IntoIterator<Item = WebhookEvent>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::InvalidWebhook("name must be non-empty".to_string()));
        }
        let parsed = Url::parse(url)
            .map_err(|err| ModelError::InvalidWebhook(format!("invalid url: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ModelError::InvalidWebhook(format!(
                "unsupported url scheme: {}",
                parsed.scheme()
            )));
        }
        let mut selected: Vec<WebhookEvent> = Vec::new();
        for event in events {
            if !selected.contains(&event) {
                selected.push(event);
            }
        }
        if selected.is_empty() {
            return Err(ModelError::InvalidWebhook("at least one event is required".to_string()));
        }
        Ok(Self {
            name,
            url: url.to_string(),
            events: selected,
        })
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the delivery URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the subscribed events.
    #[must_use]
    pub fn events(&self) -> &[WebhookEvent] {
        &self.events
    }
}

// ============================================================================
// SECTION: Deliveries
// ============================================================================

/// Webhook delivery log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookDelivery {
    /// Delivery identifier.
    pub id: DeliveryId,
    /// Event name that triggered the delivery.
    pub event_type: String,
    /// Delivery status label (`pending`, `success`, `failed`).
    pub status: String,
    /// Number of attempts so far.
    #[serde(default)]
    pub attempts: u32,
    /// HTTP status returned by the receiver.
    #[serde(default)]
    pub response_status: Option<u16>,
    /// Delivery error message.
    #[serde(default)]
    pub error: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Delivery timestamp.
    #[serde(default)]
    pub delivered_at: Option<String>,
}

/// Serde default for `is_active`.
const fn default_active() -> bool {
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

    use serde_json::json;

    use super::NewWebhook;
    use super::SubscribedEvent;
    use super::Webhook;
    use super::WebhookCreated;
    use super::WebhookEvent;

    #[test]
    fn created_payload_splits_secret_from_webhook() {
        let created: WebhookCreated = serde_json::from_value(json!({
            "id": "wh_1",
            "project_id": "p1",
            "name": "audit",
            "url": "https://example.com/hook",
            "events": ["record.created"],
            "is_active": true,
            "secret": "s3cr3t",
        }))
        .unwrap();
        assert_eq!(created.secret.expose(), "s3cr3t");
        let known = SubscribedEvent::Known(WebhookEvent::RecordCreated);
        assert_eq!(created.webhook.events, vec![known]);
        let reread = serde_json::to_value(&created.webhook).unwrap();
        assert!(reread.get("secret").is_none());
        assert!(!format!("{:?}", created.secret).contains("s3cr3t"));
    }

    #[test]
    fn new_webhook_rejects_bad_inputs() {
        assert!(NewWebhook::new("", "https://x.test", [WebhookEvent::All]).is_err());
        assert!(NewWebhook::new("a", "ftp://x.test", [WebhookEvent::All]).is_err());
        assert!(NewWebhook::new("a", "not a url", [WebhookEvent::All]).is_err());
        assert!(NewWebhook::new("a", "https://x.test", []).is_err());
        let hook = NewWebhook::new(
            "a",
            "https://x.test",
            [WebhookEvent::RecordCreated, WebhookEvent::RecordCreated],
        )
        .unwrap();
        assert_eq!(hook.events(), &[WebhookEvent::RecordCreated]);
    }

    #[test]
    fn webhook_list_keeps_events_outside_the_catalog() {
        let hooks: Vec<Webhook> = serde_json::from_value(json!([
            {
                "id": "wh_1",
                "name": "audit",
                "url": "https://x.test/a",
                "events": ["record.deleted", "*"],
            },
            {
                "id": "wh_2",
                "name": "schema",
                "url": "https://x.test/b",
                "events": ["collection.created"],
            },
        ]))
        .unwrap();
        assert_eq!(hooks.len(), 2);
        assert!(hooks[0].events[0].covers(WebhookEvent::RecordDeleted));
        assert!(hooks[0].events[1].covers(WebhookEvent::RecordCreated));
        assert_eq!(hooks[1].events, vec![SubscribedEvent::Other("collection.created".to_string())]);
        assert_eq!(hooks[1].events[0].as_str(), "collection.created");
        assert!(!hooks[1].events[0].covers(WebhookEvent::RecordCreated));
        let reread = serde_json::to_value(&hooks[1]).unwrap();
        assert_eq!(reread["events"], json!(["collection.created"]));
    }
}
