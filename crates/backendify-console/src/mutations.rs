// crates/backendify-console/src/mutations.rs
// ============================================================================
// Module: Mutation Coordinator
// Description: Create, update, and delete operations with cache invalidation.
// Purpose: Keep dependent cached views consistent after successful writes.
// Dependencies: backendify-core, thiserror, crate::{form, mapper, session, table}
// ============================================================================

//! ## Overview
//! Every write goes through [`MutationCoordinator`]. A successful write
//! invalidates the tags listed by [`MutationKind::invalidations`] before it
//! returns; a failed write invalidates nothing.
//!
//! Record write failures pass through [`apply_server_error`]: a structured
//! validation body becomes [`RecordWriteError::Rejected`], anything else stays
//! [`RecordWriteError::Failed`]. Schema and webhook write failures are returned
//! as received.
//!
//! A record delete first resolves the collections whose rows the service
//! rewrites with it (SET NULL sources) or removes with it (CASCADE sources,
//! followed transitively) so their cached pages are dropped too. The delete is
//! not sent when that schema lookup fails.
//!
//! [`MutationCoordinator::validate_form`] runs the service's rule check on a
//! form without writing. Its violations land on the form exactly like those of
//! a rejected write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;

use backendify_core::ApiError;
use backendify_core::Collection;
use backendify_core::CollectionId;
use backendify_core::Field;
use backendify_core::ModelError;
use backendify_core::MutationKind;
use backendify_core::NewCollection;
use backendify_core::NewField;
use backendify_core::NewRelationField;
use backendify_core::NewValidationRule;
use backendify_core::NewWebhook;
use backendify_core::OnDeleteAction;
use backendify_core::Record;
use backendify_core::RecordId;
use backendify_core::RuleId;
use backendify_core::RulePatch;
use backendify_core::ValidationErrorSet;
use backendify_core::ValidationRule;
use backendify_core::WebhookCreated;
use backendify_core::WebhookId;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::form::RecordForm;
use crate::form::SubmitMode;
use crate::mapper::apply_server_error;
use crate::session::ConsoleSession;
use crate::table::ConfirmedDelete;
use crate::telemetry::ClientEvent;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record write failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordWriteError {
    /// Write rejected with per-field violations, locally or by the server.
    #[error("record rejected: {} field(s) failed validation", .0.fields().count())]
    Rejected(ValidationErrorSet),
    /// Write failed for any other reason.
    #[error("record write failed: {0}")]
    Failed(ApiError),
}

impl RecordWriteError {
    /// Classifies an API error from a record write.
    #[must_use]
    pub fn from_api(error: ApiError) -> Self {
        let mapped = apply_server_error(&error);
        if mapped.is_empty() { Self::Failed(error) } else { Self::Rejected(mapped) }
    }
}

/// Schema and webhook write failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaWriteError {
    /// Payload violates a local model constraint; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ModelError),
    /// Remote API failure, unchanged.
    #[error(transparent)]
    Api(#[from] ApiError),
}

// ============================================================================
// SECTION: Delete Proof
// ============================================================================

/// Proof that a record delete succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedRecord {
    /// Collection machine name.
    collection: String,
    /// Deleted record identifier.
    id: RecordId,
}

impl DeletedRecord {
    /// Returns the collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the deleted record identifier.
    #[must_use]
    pub const fn id(&self) -> &RecordId {
        &self.id
    }
}

// ============================================================================
// SECTION: Coordinator
// ============================================================================

/// Mutation coordinator for one session.
#[derive(Clone, Copy)]
pub struct MutationCoordinator<'a> {
    /// Owning session.
    session: &'a ConsoleSession,
}

impl<'a> MutationCoordinator<'a> {
    /// Creates a coordinator over `session`.
    #[must_use]
    pub const fn new(session: &'a ConsoleSession) -> Self {
        Self {
            session,
        }
    }

    /// Awaits a write, then invalidates on success and records the outcome.
    async fn run<T, Fut>(&self, kind: MutationKind, call: Fut) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let session = self.session;
        match call.await {
            Ok(value) => {
                session.cache().invalidate(session.project(), &kind.invalidations());
                session.record(&ClientEvent::mutation(session.project(), &kind, None));
                Ok(value)
            }
            Err(err) => {
                session.record(&ClientEvent::mutation(session.project(), &kind, Some(&err)));
                Err(err)
            }
        }
    }

    /// Creates a record from a prepared payload.
    ///
    /// # Errors
    ///
    /// Returns [`RecordWriteError`] when the write fails.
    pub async fn create_record(
        &self,
        collection: &str,
        values: &Map<String, Value>,
    ) -> Result<Record, RecordWriteError> {
        let session = self.session;
        let kind = MutationKind::CreateRecord {
            collection: collection.to_string(),
        };
        self.run(kind, session.api().create_record(session.project(), collection, values))
            .await
            .map_err(RecordWriteError::from_api)
    }

    /// Updates a record from a prepared payload.
    ///
    /// # Errors
    ///
    /// Returns [`RecordWriteError`] when the write fails.
    pub async fn update_record(
        &self,
        collection: &str,
        id: &RecordId,
        values: &Map<String, Value>,
    ) -> Result<Record, RecordWriteError> {
        let session = self.session;
        let kind = MutationKind::UpdateRecord {
            collection: collection.to_string(),
        };
        self.run(kind, session.api().update_record(session.project(), collection, id, values))
            .await
            .map_err(RecordWriteError::from_api)
    }

    /// Validates a form locally, then creates a record from it.
    ///
    /// Local violations are returned without any request. Server violations
    /// are stored on the form; success clears its errors.
    ///
    /// # Errors
    ///
    /// Returns [`RecordWriteError`] when validation or the write fails.
    pub async fn submit_create(
        &self,
        collection: &str,
        form: &mut RecordForm,
    ) -> Result<Record, RecordWriteError> {
        let kind = MutationKind::CreateRecord {
            collection: collection.to_string(),
        };
        let payload = self.prepare(form, SubmitMode::Create, &kind)?;
        let result = self.create_record(collection, &payload).await;
        Self::settle(form, result)
    }

    /// Validates a form locally, then patches a record with its touched fields.
    ///
    /// # Errors
    ///
    /// Returns [`RecordWriteError`] when validation or the write fails.
    pub async fn submit_update(
        &self,
        collection: &str,
        id: &RecordId,
        form: &mut RecordForm,
    ) -> Result<Record, RecordWriteError> {
        let kind = MutationKind::UpdateRecord {
            collection: collection.to_string(),
        };
        let payload = self.prepare(form, SubmitMode::Update, &kind)?;
        let result = self.update_record(collection, id, &payload).await;
        Self::settle(form, result)
    }

    /// Runs local validation and records a local rejection.
    fn prepare(
        &self,
        form: &mut RecordForm,
        mode: SubmitMode,
        kind: &MutationKind,
    ) -> Result<Map<String, Value>, RecordWriteError> {
        form.prepare_submission(mode).map_err(|errors| {
            self.session.record(&ClientEvent::mutation_rejected(self.session.project(), kind));
            RecordWriteError::Rejected(errors)
        })
    }

    /// Mirrors a write outcome onto the form's error state.
    fn settle(
        form: &mut RecordForm,
        result: Result<Record, RecordWriteError>,
    ) -> Result<Record, RecordWriteError> {
        match &result {
            Ok(_) => form.submission_succeeded(),
            Err(RecordWriteError::Rejected(errors)) => form.apply_errors(errors.clone()),
            Err(RecordWriteError::Failed(_)) => {}
        }
        result
    }

    /// Resolves the collections a delete in `collection` rewrites or removes.
    async fn delete_dependents(&self, collection: &str) -> Result<Vec<String>, ApiError> {
        let registry = self.session.registry();
        let collections = registry.list_collections().await?;
        let mut pending: Vec<CollectionId> = collections
            .iter()
            .filter(|candidate| candidate.name == collection)
            .map(|candidate| candidate.id.clone())
            .collect();
        let mut visited: Vec<CollectionId> = Vec::new();
        let mut dependents: Vec<String> = Vec::new();
        while let Some(target) = pending.pop() {
            if visited.contains(&target) {
                continue;
            }
            visited.push(target.clone());
            for edge in registry.list_reverse_relations(&target).await? {
                let fields = registry.list_relation_fields(&edge.source_collection_id).await?;
                let action = fields
                    .iter()
                    .find(|field| field.id == edge.id)
                    .and_then(Field::relation)
                    .map(|spec| spec.on_delete);
                match action {
                    Some(OnDeleteAction::Restrict) => continue,
                    Some(OnDeleteAction::SetNull) => {}
                    // Unknown actions are followed like cascades.
                    Some(OnDeleteAction::Cascade) | None => {
                        pending.push(edge.source_collection_id.clone());
                    }
                }
                let name = edge.source_collection_name.clone().or_else(|| {
                    collections
                        .iter()
                        .find(|candidate| candidate.id == edge.source_collection_id)
                        .map(|candidate| candidate.name.clone())
                });
                if let Some(name) = name
                    && !dependents.contains(&name)
                {
                    dependents.push(name);
                }
            }
        }
        Ok(dependents)
    }

    /// Deletes a confirmed record.
    ///
    /// On success the record pages of the collection and of every dependent
    /// collection are invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`RecordWriteError`] when the dependent lookup or the delete
    /// fails; nothing is invalidated.
    pub async fn delete_record(
        &self,
        confirmed: ConfirmedDelete,
    ) -> Result<DeletedRecord, RecordWriteError> {
        let session = self.session;
        let dependents =
            self.delete_dependents(confirmed.collection()).await.map_err(RecordWriteError::Failed)?;
        let kind = MutationKind::DeleteRecord {
            collection: confirmed.collection().to_string(),
            dependents,
        };
        self.run(
            kind,
            session.api().delete_record(session.project(), confirmed.collection(), confirmed.id()),
        )
        .await
        .map_err(RecordWriteError::from_api)?;
        Ok(DeletedRecord {
            collection: confirmed.collection().to_string(),
            id: confirmed.id().clone(),
        })
    }

    /// Creates a collection.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaWriteError::Invalid`] for a bad name before any request,
    /// or [`SchemaWriteError::Api`] when the write fails.
    pub async fn create_collection(
        &self,
        name: &str,
        display_name: &str,
    ) -> Result<Collection, SchemaWriteError> {
        let session = self.session;
        let payload = NewCollection::new(name, display_name)?;
        Ok(self
            .run(
                MutationKind::CreateCollection,
                session.api().create_collection(session.project(), &payload),
            )
            .await?)
    }

    /// Adds a scalar field to a collection.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaWriteError::Api`] when the write fails.
    pub async fn create_field(
        &self,
        collection: &str,
        payload: &NewField,
    ) -> Result<Field, SchemaWriteError> {
        let session = self.session;
        let kind = MutationKind::CreateField {
            collection: collection.to_string(),
        };
        let call = session.api().create_field(session.project(), collection, payload);
        Ok(self.run(kind, call).await?)
    }

    /// Adds a relation field to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaWriteError::Invalid`] for a self-referencing relation
    /// before any request, or [`SchemaWriteError::Api`] when the write fails.
    pub async fn create_relation_field(
        &self,
        owner: &Collection,
        payload: &NewRelationField,
    ) -> Result<Field, SchemaWriteError> {
        if payload.target_collection_id == owner.id {
            return Err(SchemaWriteError::Invalid(ModelError::InvalidField {
                field: payload.name.clone(),
                reason: "relation cannot target its own collection",
            }));
        }
        let session = self.session;
        let kind = MutationKind::CreateRelationField {
            owner: owner.id.clone(),
            collection: owner.name.clone(),
            target: payload.target_collection_id.clone(),
        };
        Ok(self
            .run(kind, session.api().create_relation_field(session.project(), &owner.id, payload))
            .await?)
    }

    /// Creates a webhook. The returned secret is shown once and never cached.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaWriteError::Api`] when the write fails.
    pub async fn create_webhook(
        &self,
        payload: &NewWebhook,
    ) -> Result<WebhookCreated, SchemaWriteError> {
        let session = self.session;
        let call = session.api().create_webhook(session.project(), payload);
        Ok(self.run(MutationKind::CreateWebhook, call).await?)
    }

    /// Deletes a webhook.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaWriteError::Api`] when the delete fails.
    pub async fn delete_webhook(&self, id: &WebhookId) -> Result<(), SchemaWriteError> {
        let session = self.session;
        let kind = MutationKind::DeleteWebhook {
            webhook: id.clone(),
        };
        Ok(self.run(kind, session.api().delete_webhook(session.project(), id)).await?)
    }

    /// Attaches a validation rule to `field` of `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaWriteError::Invalid`] when the rule type does not apply
    /// to the field's type, before any request, or [`SchemaWriteError::Api`]
    /// when the write fails.
    pub async fn create_rule(
        &self,
        collection: &str,
        field: &Field,
        payload: &NewValidationRule,
    ) -> Result<ValidationRule, SchemaWriteError> {
        let rule_type = payload.rule_type();
        if !rule_type.applies_to_field(field) {
            return Err(SchemaWriteError::Invalid(ModelError::InvalidRule(format!(
                "{rule_type} cannot be applied to field {}",
                field.name
            ))));
        }
        let session = self.session;
        let kind = MutationKind::CreateRule {
            collection: collection.to_string(),
        };
        let call = session.api().create_validation_rule(
            session.project(),
            collection,
            &field.name,
            payload,
        );
        Ok(self.run(kind, call).await?)
    }

    /// Updates a validation rule of `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaWriteError::Invalid`] for an empty patch, before any
    /// request, or [`SchemaWriteError::Api`] when the write fails.
    pub async fn update_rule(
        &self,
        collection: &str,
        id: &RuleId,
        patch: &RulePatch,
    ) -> Result<ValidationRule, SchemaWriteError> {
        if patch.is_empty() {
            return Err(SchemaWriteError::Invalid(ModelError::InvalidRule(
                "update changes nothing".to_string(),
            )));
        }
        let session = self.session;
        let kind = MutationKind::UpdateRule {
            collection: collection.to_string(),
        };
        let call = session.api().update_validation_rule(session.project(), id, patch);
        Ok(self.run(kind, call).await?)
    }

    /// Deletes a validation rule of `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaWriteError::Api`] when the delete fails.
    pub async fn delete_rule(&self, collection: &str, id: &RuleId) -> Result<(), SchemaWriteError> {
        let session = self.session;
        let kind = MutationKind::DeleteRule {
            collection: collection.to_string(),
        };
        Ok(self.run(kind, session.api().delete_validation_rule(session.project(), id)).await?)
    }

    /// Checks a form against local constraints, then the service's rules,
    /// without writing.
    ///
    /// Violations are stored on the form; a clean result clears its errors.
    /// Nothing is invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`RecordWriteError::Rejected`] with the violations, or
    /// [`RecordWriteError::Failed`] when the check itself fails.
    pub async fn validate_form(
        &self,
        collection: &str,
        form: &mut RecordForm,
        mode: SubmitMode,
    ) -> Result<(), RecordWriteError> {
        let payload = form.prepare_submission(mode).map_err(RecordWriteError::Rejected)?;
        let session = self.session;
        let result = session
            .api()
            .validate_record(session.project(), collection, &payload)
            .await
            .map_err(RecordWriteError::from_api)?;
        if result.is_valid || result.errors.is_empty() {
            form.submission_succeeded();
            return Ok(());
        }
        form.apply_errors(result.errors.clone());
        Err(RecordWriteError::Rejected(result.errors))
    }
}
