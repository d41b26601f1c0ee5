// crates/backendify-core/src/interfaces/mod.rs
// ============================================================================
// Module: Backendify Interfaces
// Description: Transport-agnostic contract for the remote Backendify API.
// Purpose: Let console logic run against HTTP or in-process backends alike.
// Dependencies: async-trait, thiserror, crate::core
// ============================================================================

//! ## Overview
//! [`RemoteApi`] mirrors the request/response contract of the remote service.
//! Every call is scoped by a [`ProjectId`]. Implementations return the
//! server's own status and body on rejection so the console can map
//! structured validation errors back onto form fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::CollectionId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::RecordId;
use crate::core::identifiers::RuleId;
use crate::core::identifiers::WebhookId;
use crate::core::record::Record;
use crate::core::record::RecordPage;
use crate::core::record::RecordQuery;
use crate::core::rules::NewValidationRule;
use crate::core::rules::RecordValidation;
use crate::core::rules::RulePatch;
use crate::core::rules::RuleTypeInfo;
use crate::core::rules::ValidationRule;
use crate::core::schema::Collection;
use crate::core::schema::Field;
use crate::core::schema::NewCollection;
use crate::core::schema::NewField;
use crate::core::schema::NewRelationField;
use crate::core::schema::RelationOptions;
use crate::core::schema::ReverseRelation;
use crate::core::webhook::NewWebhook;
use crate::core::webhook::Webhook;
use crate::core::webhook::WebhookCreated;
use crate::core::webhook::WebhookDelivery;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Remote API call errors.
///
/// # Invariants
/// - `Status` carries the raw response body so callers can parse structured
///   error details themselves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Client configuration is unusable.
    #[error("api client configuration error: {0}")]
    Config(String),
    /// Request could not be sent or the response could not be read.
    #[error("api transport error: {0}")]
    Transport(String),
    /// Service answered with a non-success status.
    #[error("api returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// Response body did not match the expected shape.
    #[error("api response decode error: {0}")]
    Decode(String),
    /// Response body exceeded the configured size limit.
    #[error("api response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Observed body size in bytes.
        actual: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
}

impl ApiError {
    /// Returns the HTTP status for `Status` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status {
                status, ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body for `Status` errors.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status {
                body, ..
            } => Some(body),
            _ => None,
        }
    }

    /// Returns true for a 404 response.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }
}

// ============================================================================
// SECTION: Remote API
// ============================================================================

/// Remote Backendify API contract.
///
/// # Invariants
/// - Implementations never retry and never follow redirects.
/// - Record values are sent exactly as given; the client adds no defaults.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Lists collections of a project.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    async fn list_collections(&self, project: &ProjectId) -> Result<Vec<Collection>, ApiError>;

    /// Creates a collection.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or is rejected.
    async fn create_collection(
        &self,
        project: &ProjectId,
        payload: &NewCollection,
    ) -> Result<Collection, ApiError>;

    /// Lists the fields of a collection by machine name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    async fn list_fields(&self, project: &ProjectId, collection: &str)
    -> Result<Vec<Field>, ApiError>;

    /// Adds a scalar field to a collection.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or is rejected.
    async fn create_field(
        &self,
        project: &ProjectId,
        collection: &str,
        payload: &NewField,
    ) -> Result<Field, ApiError>;

    /// Lists one page of records.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    async fn list_records(
        &self,
        project: &ProjectId,
        collection: &str,
        query: &RecordQuery,
    ) -> Result<RecordPage, ApiError>;

    /// Fetches a single record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or the record is missing.
    async fn get_record(
        &self,
        project: &ProjectId,
        collection: &str,
        id: &RecordId,
    ) -> Result<Record, ApiError>;

    /// Creates a record from the given values.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails; validation rejections are
    /// `Status { status: 400, .. }` with a structured body.
    async fn create_record(
        &self,
        project: &ProjectId,
        collection: &str,
        values: &Map<String, Value>,
    ) -> Result<Record, ApiError>;

    /// Partially updates a record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or is rejected.
    async fn update_record(
        &self,
        project: &ProjectId,
        collection: &str,
        id: &RecordId,
        values: &Map<String, Value>,
    ) -> Result<Record, ApiError>;

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or is rejected.
    async fn delete_record(
        &self,
        project: &ProjectId,
        collection: &str,
        id: &RecordId,
    ) -> Result<(), ApiError>;

    /// Lists the outgoing relation fields of a collection.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    async fn list_relation_fields(
        &self,
        project: &ProjectId,
        collection_id: &CollectionId,
    ) -> Result<Vec<Field>, ApiError>;

    /// Adds a relation field to a collection.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or is rejected.
    async fn create_relation_field(
        &self,
        project: &ProjectId,
        collection_id: &CollectionId,
        payload: &NewRelationField,
    ) -> Result<Field, ApiError>;

    /// Lists relation fields of other collections that target this one.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    async fn list_reverse_relations(
        &self,
        project: &ProjectId,
        collection_id: &CollectionId,
    ) -> Result<Vec<ReverseRelation>, ApiError>;

    /// Returns the relation types and on-delete actions the service supports.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    async fn relation_options(&self, project: &ProjectId) -> Result<RelationOptions, ApiError>;

    /// Lists webhooks. Reads never include secrets.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    async fn list_webhooks(&self, project: &ProjectId) -> Result<Vec<Webhook>, ApiError>;

    /// Creates a webhook and returns its one-time secret.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or is rejected.
    async fn create_webhook(
        &self,
        project: &ProjectId,
        payload: &NewWebhook,
    ) -> Result<WebhookCreated, ApiError>;

    /// Deletes a webhook.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or is rejected.
    async fn delete_webhook(&self, project: &ProjectId, id: &WebhookId) -> Result<(), ApiError>;

    /// Lists the delivery log of a webhook.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    async fn list_webhook_deliveries(
        &self,
        project: &ProjectId,
        id: &WebhookId,
    ) -> Result<Vec<WebhookDelivery>, ApiError>;

    /// Lists the active validation rules of a field, lowest priority first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or the field is missing.
    async fn list_validation_rules(
        &self,
        project: &ProjectId,
        collection: &str,
        field: &str,
    ) -> Result<Vec<ValidationRule>, ApiError>;

    /// Attaches a validation rule to a field.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or is rejected.
    async fn create_validation_rule(
        &self,
        project: &ProjectId,
        collection: &str,
        field: &str,
        payload: &NewValidationRule,
    ) -> Result<ValidationRule, ApiError>;

    /// Partially updates a validation rule.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or the rule is missing.
    async fn update_validation_rule(
        &self,
        project: &ProjectId,
        id: &RuleId,
        patch: &RulePatch,
    ) -> Result<ValidationRule, ApiError>;

    /// Deletes a validation rule.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or the rule is missing.
    async fn delete_validation_rule(
        &self,
        project: &ProjectId,
        id: &RuleId,
    ) -> Result<(), ApiError>;

    /// Checks a record payload against the collection's rules without writing.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails; violations are a successful
    /// [`RecordValidation`] with `is_valid == false`.
    async fn validate_record(
        &self,
        project: &ProjectId,
        collection: &str,
        values: &Map<String, Value>,
    ) -> Result<RecordValidation, ApiError>;

    /// Returns the rule types the service supports.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    async fn rule_types(&self, project: &ProjectId) -> Result<Vec<RuleTypeInfo>, ApiError>;
}
