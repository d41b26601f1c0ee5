// crates/backendify-console/src/queries.rs
// ============================================================================
// Module: Data Queries
// Description: Cached reads of record pages, single records, and webhooks.
// Purpose: Share record and webhook reads under invalidatable cache tags.
// Dependencies: backendify-core, crate::cache
// ============================================================================

//! ## Overview
//! Record pages are cached per collection with the query string as the key
//! variant, so any record mutation in that collection stales every page.

// ============================================================================
// SECTION: Imports
// ============================================================================

use backendify_core::ApiError;
use backendify_core::CacheKey;
use backendify_core::CacheTag;
use backendify_core::Record;
use backendify_core::RecordId;
use backendify_core::RecordPage;
use backendify_core::RecordQuery;
use backendify_core::Webhook;
use backendify_core::WebhookDelivery;
use backendify_core::WebhookId;

use crate::session::ConsoleSession;

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Cached record and webhook reads for one session.
#[derive(Clone, Copy)]
pub struct DataQueries<'a> {
    /// Owning session.
    session: &'a ConsoleSession,
}

impl<'a> DataQueries<'a> {
    /// Creates a query helper over `session`.
    #[must_use]
    pub const fn new(session: &'a ConsoleSession) -> Self {
        Self {
            session,
        }
    }

    /// Lists one page of records.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn list_records(
        &self,
        collection: &str,
        query: &RecordQuery,
    ) -> Result<RecordPage, ApiError> {
        let session = self.session;
        let variant = query
            .query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let key = CacheKey::with_variant(
            session.project().clone(),
            CacheTag::Records(collection.to_string()),
            variant,
        );
        session
            .cache()
            .get_or_fetch(key, || session.api().list_records(session.project(), collection, query))
            .await
    }

    /// Lists the first page of records using the configured page size.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn first_page(&self, collection: &str) -> Result<RecordPage, ApiError> {
        let query = RecordQuery::page(self.session.settings().page_size, 0);
        self.list_records(collection, &query).await
    }

    /// Fetches one record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn get_record(&self, collection: &str, id: &RecordId) -> Result<Record, ApiError> {
        let session = self.session;
        let key = CacheKey::with_variant(
            session.project().clone(),
            CacheTag::Records(collection.to_string()),
            format!("id={id}"),
        );
        session
            .cache()
            .get_or_fetch(key, || session.api().get_record(session.project(), collection, id))
            .await
    }

    /// Lists webhooks. Reads never carry secrets.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn list_webhooks(&self) -> Result<Vec<Webhook>, ApiError> {
        let session = self.session;
        session
            .cache()
            .get_or_fetch(session.key(CacheTag::Webhooks), || {
                session.api().list_webhooks(session.project())
            })
            .await
    }

    /// Lists the delivery log of a webhook.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn list_deliveries(&self, id: &WebhookId) -> Result<Vec<WebhookDelivery>, ApiError> {
        let session = self.session;
        session
            .cache()
            .get_or_fetch(session.key(CacheTag::WebhookDeliveries(id.clone())), || {
                session.api().list_webhook_deliveries(session.project(), id)
            })
            .await
    }
}
