// crates/backendify-client/src/memory.rs
// ============================================================================
// Module: Backendify In-Memory Service
// Description: In-process model of the remote Backendify API.
// Purpose: Exercise console logic without a network, with server-shaped errors.
// Dependencies: backendify-core, rand, sha2, serde_json
// ============================================================================

//! ## Overview
//! [`InMemoryApi`] implements [`RemoteApi`] against mutex-protected maps. It
//! reproduces the service behaviors the console depends on:
//! - rejected writes return `400 {"detail": {"validation_errors": {...}}}`;
//! - relation values are checked against the target collection and
//!   `RESTRICT`, `CASCADE`, and `SET NULL` are applied on delete;
//! - webhook secrets are generated once and only their SHA-256 hash is kept;
//! - record events append pending entries to subscribed webhooks' delivery logs;
//! - field validation rules are enforced on writes and by the dry-run check.
//!
//! Timestamps come from a per-project logical clock so output is deterministic.
//! Tests can count calls with [`InMemoryApi::request_count`] and queue
//! failures with [`InMemoryApi::fail_next`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use backendify_core::ApiError;
use backendify_core::Collection;
use backendify_core::CollectionId;
use backendify_core::DeliveryId;
use backendify_core::Field;
use backendify_core::FieldId;
use backendify_core::FieldKind;
use backendify_core::FilterOperator;
use backendify_core::NewCollection;
use backendify_core::NewField;
use backendify_core::NewRelationField;
use backendify_core::NewValidationRule;
use backendify_core::NewWebhook;
use backendify_core::OnDeleteAction;
use backendify_core::ProjectId;
use backendify_core::REQUIRED_MESSAGE;
use backendify_core::Record;
use backendify_core::RecordFilter;
use backendify_core::RecordId;
use backendify_core::RecordPage;
use backendify_core::RecordQuery;
use backendify_core::RecordValidation;
use backendify_core::RelationOption;
use backendify_core::RelationOptions;
use backendify_core::RelationSpec;
use backendify_core::RelationType;
use backendify_core::RemoteApi;
use backendify_core::ReverseRelation;
use backendify_core::RuleId;
use backendify_core::RulePatch;
use backendify_core::RuleType;
use backendify_core::RuleTypeInfo;
use backendify_core::SYSTEM_COLUMNS;
use backendify_core::ScalarType;
use backendify_core::SortKey;
use backendify_core::SubscribedEvent;
use backendify_core::ValidationErrorSet;
use backendify_core::ValidationRule;
use backendify_core::Webhook;
use backendify_core::WebhookCreated;
use backendify_core::WebhookDelivery;
use backendify_core::WebhookEvent;
use backendify_core::WebhookId;
use backendify_core::WebhookSecret;
use rand::RngCore;
use rand::rngs::OsRng;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use sha2::Digest;
use sha2::Sha256;

use crate::rules;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of random bytes in a generated webhook secret.
const WEBHOOK_SECRET_BYTES: usize = 32;
/// Prefix applied to generated webhook secrets.
const WEBHOOK_SECRET_PREFIX: &str = "whsec_";

// ============================================================================
// SECTION: Service
// ============================================================================

/// In-process implementation of [`RemoteApi`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryApi {
    /// Service state protected by a mutex.
    state: Arc<Mutex<ServiceState>>,
}

/// Whole-service state.
#[derive(Debug, Default)]
struct ServiceState {
    /// Projects by id.
    projects: BTreeMap<ProjectId, ProjectState>,
    /// Number of contract calls received.
    requests: u64,
    /// Failures returned by the next calls, in order.
    injected: VecDeque<ApiError>,
}

impl InMemoryApi {
    /// Creates an empty service with no projects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the service with an additional empty project.
    #[must_use]
    pub fn with_project(self, project: impl Into<ProjectId>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.projects.entry(project.into()).or_default();
        }
        self
    }

    /// Returns the number of contract calls received so far.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.state.lock().map_or(0, |state| state.requests)
    }

    /// Queues an error returned by the next contract call.
    pub fn fail_next(&self, error: ApiError) {
        if let Ok(mut state) = self.state.lock() {
            state.injected.push_back(error);
        }
    }

    /// Returns true when `secret` hashes to the stored hash of the webhook.
    #[must_use]
    pub fn verify_webhook_secret(&self, project: &ProjectId, id: &WebhookId, secret: &str) -> bool {
        let Ok(state) = self.state.lock() else {
            return false;
        };
        state.projects.get(project).is_some_and(|project| {
            project
                .webhooks
                .iter()
                .any(|stored| &stored.webhook.id == id && stored.secret_hash == hash_secret(secret))
        })
    }

    /// Locks state, counts the call, and applies queued failures.
    fn begin(&self) -> Result<MutexGuard<'_, ServiceState>, ApiError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ApiError::Transport("in-memory service mutex poisoned".to_string()))?;
        state.requests += 1;
        if let Some(error) = state.injected.pop_front() {
            return Err(error);
        }
        Ok(state)
    }
}

/// Runs `op` against one project of a locked service.
fn in_project<T>(
    state: &mut ServiceState,
    project: &ProjectId,
    op: impl FnOnce(&mut ProjectState) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let project = state.projects.get_mut(project).ok_or_else(|| detail(404, "Project not found"))?;
    op(project)
}

#[async_trait]
impl RemoteApi for InMemoryApi {
    async fn list_collections(&self, project: &ProjectId) -> Result<Vec<Collection>, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            Ok(p.collections.iter().filter(|c| c.is_active).cloned().collect())
        })
    }

    async fn create_collection(
        &self,
        project: &ProjectId,
        payload: &NewCollection,
    ) -> Result<Collection, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.create_collection(payload))
    }

    async fn list_fields(
        &self,
        project: &ProjectId,
        collection: &str,
    ) -> Result<Vec<Field>, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            let id = p.collection_by_name(collection)?.id.clone();
            Ok(p.fields.get(&id).cloned().unwrap_or_default())
        })
    }

    async fn create_field(
        &self,
        project: &ProjectId,
        collection: &str,
        payload: &NewField,
    ) -> Result<Field, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.create_field(collection, payload))
    }

    async fn list_records(
        &self,
        project: &ProjectId,
        collection: &str,
        query: &RecordQuery,
    ) -> Result<RecordPage, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.list_records(collection, query))
    }

    async fn get_record(
        &self,
        project: &ProjectId,
        collection: &str,
        id: &RecordId,
    ) -> Result<Record, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            let collection_id = p.collection_by_name(collection)?.id.clone();
            let row = p
                .rows(&collection_id)
                .iter()
                .find(|row| row_matches_id(row, id))
                .ok_or_else(|| detail(404, "Record not found"))?;
            p.to_record(&collection_id, row)
        })
    }

    async fn create_record(
        &self,
        project: &ProjectId,
        collection: &str,
        values: &Map<String, Value>,
    ) -> Result<Record, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.create_record(collection, values))
    }

    async fn update_record(
        &self,
        project: &ProjectId,
        collection: &str,
        id: &RecordId,
        values: &Map<String, Value>,
    ) -> Result<Record, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.update_record(collection, id, values))
    }

    async fn delete_record(
        &self,
        project: &ProjectId,
        collection: &str,
        id: &RecordId,
    ) -> Result<(), ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.delete_record(collection, id))
    }

    async fn list_relation_fields(
        &self,
        project: &ProjectId,
        collection_id: &CollectionId,
    ) -> Result<Vec<Field>, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            p.collection_by_id(collection_id)?;
            Ok(p.fields_of(collection_id).iter().filter(|f| f.is_relation()).cloned().collect())
        })
    }

    async fn create_relation_field(
        &self,
        project: &ProjectId,
        collection_id: &CollectionId,
        payload: &NewRelationField,
    ) -> Result<Field, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.create_relation_field(collection_id, payload))
    }

    async fn list_reverse_relations(
        &self,
        project: &ProjectId,
        collection_id: &CollectionId,
    ) -> Result<Vec<ReverseRelation>, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            p.collection_by_id(collection_id)?;
            Ok(p.reverse_relations(collection_id))
        })
    }

    async fn relation_options(&self, project: &ProjectId) -> Result<RelationOptions, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |_| Ok(advertised_relation_options()))
    }

    async fn list_webhooks(&self, project: &ProjectId) -> Result<Vec<Webhook>, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            Ok(p.webhooks.iter().map(|stored| stored.webhook.clone()).collect())
        })
    }

    async fn create_webhook(
        &self,
        project: &ProjectId,
        payload: &NewWebhook,
    ) -> Result<WebhookCreated, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.create_webhook(project, payload))
    }

    async fn delete_webhook(&self, project: &ProjectId, id: &WebhookId) -> Result<(), ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            let before = p.webhooks.len();
            p.webhooks.retain(|stored| &stored.webhook.id != id);
            if p.webhooks.len() == before {
                return Err(detail(404, "Webhook not found"));
            }
            p.deliveries.remove(id);
            Ok(())
        })
    }

    async fn list_webhook_deliveries(
        &self,
        project: &ProjectId,
        id: &WebhookId,
    ) -> Result<Vec<WebhookDelivery>, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            if !p.webhooks.iter().any(|stored| &stored.webhook.id == id) {
                return Err(detail(404, "Webhook not found"));
            }
            Ok(p.deliveries.get(id).cloned().unwrap_or_default())
        })
    }

    async fn list_validation_rules(
        &self,
        project: &ProjectId,
        collection: &str,
        field: &str,
    ) -> Result<Vec<ValidationRule>, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            let field = p.field_by_name(collection, field)?;
            Ok(p.active_rules(&field.id).into_iter().cloned().collect())
        })
    }

    async fn create_validation_rule(
        &self,
        project: &ProjectId,
        collection: &str,
        field: &str,
        payload: &NewValidationRule,
    ) -> Result<ValidationRule, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.create_validation_rule(collection, field, payload))
    }

    async fn update_validation_rule(
        &self,
        project: &ProjectId,
        id: &RuleId,
        patch: &RulePatch,
    ) -> Result<ValidationRule, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| p.update_validation_rule(id, patch))
    }

    async fn delete_validation_rule(
        &self,
        project: &ProjectId,
        id: &RuleId,
    ) -> Result<(), ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            let before = p.rules.len();
            p.rules.retain(|rule| &rule.id != id);
            if p.rules.len() == before {
                return Err(detail(404, "Rule not found"));
            }
            Ok(())
        })
    }

    async fn validate_record(
        &self,
        project: &ProjectId,
        collection: &str,
        values: &Map<String, Value>,
    ) -> Result<RecordValidation, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |p| {
            let collection_id = p.collection_by_name(collection)?.id.clone();
            let errors = p.rule_violations(&collection_id, values);
            Ok(RecordValidation {
                is_valid: errors.is_empty(),
                errors,
            })
        })
    }

    async fn rule_types(&self, project: &ProjectId) -> Result<Vec<RuleTypeInfo>, ApiError> {
        let mut state = self.begin()?;
        in_project(&mut state, project, |_| {
            Ok(RuleType::CATALOG.into_iter().map(RuleTypeInfo::from_rule_type).collect())
        })
    }
}

// ============================================================================
// SECTION: Project State
// ============================================================================

/// Stored webhook plus its secret hash.
#[derive(Debug, Clone)]
struct StoredWebhook {
    /// Read shape.
    webhook: Webhook,
    /// Lowercase hex SHA-256 of the secret.
    secret_hash: String,
}

/// Rows of one collection.
#[derive(Debug, Default)]
struct StoredRows {
    /// Last issued integer id.
    last_id: i64,
    /// Rows in insertion order, keyed by storage column.
    rows: Vec<Map<String, Value>>,
}

/// State of a single project.
#[derive(Debug, Default)]
struct ProjectState {
    /// Collections in creation order.
    collections: Vec<Collection>,
    /// Fields per collection in creation order.
    fields: BTreeMap<CollectionId, Vec<Field>>,
    /// Rows per collection.
    records: BTreeMap<CollectionId, StoredRows>,
    /// Webhooks in creation order.
    webhooks: Vec<StoredWebhook>,
    /// Delivery logs per webhook.
    deliveries: BTreeMap<WebhookId, Vec<WebhookDelivery>>,
    /// Validation rules in creation order.
    rules: Vec<ValidationRule>,
    /// Last issued entity sequence number.
    sequence: u64,
    /// Logical clock.
    clock: u64,
}

impl ProjectState {
    /// Issues a new prefixed identifier.
    fn mint(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}_{}", self.sequence)
    }

    /// Advances the logical clock and returns its timestamp label.
    fn tick(&mut self) -> String {
        self.clock += 1;
        format!("t{:06}", self.clock)
    }

    /// Finds an active collection by machine name.
    fn collection_by_name(&self, name: &str) -> Result<&Collection, ApiError> {
        self.collections
            .iter()
            .find(|c| c.is_active && c.name == name)
            .ok_or_else(|| detail(404, "Collection not found"))
    }

    /// Finds an active collection by id.
    fn collection_by_id(&self, id: &CollectionId) -> Result<&Collection, ApiError> {
        self.collections
            .iter()
            .find(|c| c.is_active && &c.id == id)
            .ok_or_else(|| detail(404, "Collection not found"))
    }

    /// Returns the fields of a collection in creation order.
    fn fields_of(&self, id: &CollectionId) -> &[Field] {
        self.fields.get(id).map_or(&[], Vec::as_slice)
    }

    /// Returns the stored rows of a collection.
    fn rows(&self, id: &CollectionId) -> &[Map<String, Value>] {
        self.records.get(id).map_or(&[], |stored| stored.rows.as_slice())
    }

    /// Creates a collection, rejecting duplicate names.
    fn create_collection(&mut self, payload: &NewCollection) -> Result<Collection, ApiError> {
        if self.collections.iter().any(|c| c.name == payload.name()) {
            return Err(detail(
                400,
                &format!("Collection with name '{}' already exists", payload.name()),
            ));
        }
        let now = self.tick();
        let collection = Collection {
            id: CollectionId::new(self.mint("col")),
            name: payload.name().to_string(),
            display_name: payload.display_name().to_string(),
            is_active: true,
            is_system: false,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        self.fields.insert(collection.id.clone(), Vec::new());
        self.records.insert(collection.id.clone(), StoredRows::default());
        self.collections.push(collection.clone());
        Ok(collection)
    }

    /// Rejects duplicate or reserved field names.
    fn check_new_field_name(
        &self,
        collection_id: &CollectionId,
        name: &str,
    ) -> Result<(), ApiError> {
        if SYSTEM_COLUMNS.contains(&name) {
            return Err(detail(400, &format!("Field name '{name}' is reserved")));
        }
        if self.fields_of(collection_id).iter().any(|f| f.name == name) {
            return Err(detail(400, &format!("Field '{name}' already exists")));
        }
        Ok(())
    }

    /// Adds a scalar field to a collection.
    fn create_field(&mut self, collection: &str, payload: &NewField) -> Result<Field, ApiError> {
        let collection_id = self.collection_by_name(collection)?.id.clone();
        self.check_new_field_name(&collection_id, &payload.name)?;
        if let ScalarType::Unknown(raw) = &payload.field_type {
            return Err(detail(400, &format!("Invalid field type: {raw}")));
        }
        if payload.is_required
            && payload.default_value.is_none()
            && !self.rows(&collection_id).is_empty()
        {
            return Err(detail(
                400,
                "Cannot add a required field without a default to a collection with records",
            ));
        }
        let field = Field {
            id: FieldId::new(self.mint("fld")),
            collection_id: Some(collection_id.clone()),
            name: payload.name.clone(),
            display_name: payload.display_name.clone(),
            kind: FieldKind::Scalar(payload.field_type.clone()),
            sql_column_name: Some(payload.name.clone()),
            is_required: payload.is_required,
            is_unique: payload.is_unique,
            is_indexed: payload.is_indexed,
            is_system: false,
            is_hidden: false,
            default_value: payload.default_value.clone(),
        };
        self.fields.entry(collection_id).or_default().push(field.clone());
        Ok(field)
    }

    /// Adds a relation field stored under `{name}_id`.
    fn create_relation_field(
        &mut self,
        collection_id: &CollectionId,
        payload: &NewRelationField,
    ) -> Result<Field, ApiError> {
        self.collection_by_id(collection_id)?;
        self.collection_by_id(&payload.target_collection_id)
            .map_err(|_| detail(400, "Target collection not found"))?;
        if &payload.target_collection_id == collection_id {
            return Err(detail(400, "Cannot create self-referencing relation in v1"));
        }
        if payload.relation_type != RelationType::ManyToOne {
            return Err(detail(
                400,
                &format!(
                    "Invalid relation type: {}. Must be one of ['many_to_one']",
                    payload.relation_type.as_str()
                ),
            ));
        }
        self.check_new_field_name(collection_id, &payload.name)?;
        if payload.is_required && !self.rows(collection_id).is_empty() {
            return Err(detail(
                400,
                "Cannot add a required relation to a collection with records",
            ));
        }
        let field = Field {
            id: FieldId::new(self.mint("fld")),
            collection_id: Some(collection_id.clone()),
            name: payload.name.clone(),
            display_name: payload.display_name.clone(),
            kind: FieldKind::Relation(RelationSpec {
                target_collection_id: payload.target_collection_id.clone(),
                relation_type: payload.relation_type,
                on_delete: payload.on_delete,
                display_field: payload.display_field.clone(),
            }),
            sql_column_name: Some(format!("{}_id", payload.name)),
            is_required: payload.is_required,
            is_unique: false,
            is_indexed: true,
            is_system: false,
            is_hidden: false,
            default_value: None,
        };
        self.fields.entry(collection_id.clone()).or_default().push(field.clone());
        Ok(field)
    }

    /// Lists relation fields of any collection that target `target`.
    fn reverse_relations(&self, target: &CollectionId) -> Vec<ReverseRelation> {
        let mut edges = Vec::new();
        for collection in self.collections.iter().filter(|c| c.is_active) {
            for field in self.fields_of(&collection.id) {
                let Some(spec) = field.relation() else {
                    continue;
                };
                if &spec.target_collection_id != target {
                    continue;
                }
                edges.push(ReverseRelation {
                    id: field.id.clone(),
                    name: field.name.clone(),
                    display_name: field.display_name.clone(),
                    source_collection_id: collection.id.clone(),
                    source_collection_name: Some(collection.name.clone()),
                    relation_type: RelationType::OneToMany,
                    sql_column_name: field.sql_column_name.clone(),
                });
            }
        }
        edges
    }

    /// Finds a field of an active collection by machine name.
    fn field_by_name(&self, collection: &str, field: &str) -> Result<&Field, ApiError> {
        let collection_id = &self.collection_by_name(collection)?.id;
        self.fields_of(collection_id)
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| detail(404, "Field not found"))
    }

    /// Returns the active rules of a field, lowest priority first.
    fn active_rules(&self, field: &FieldId) -> Vec<&ValidationRule> {
        let mut rules: Vec<&ValidationRule> =
            self.rules.iter().filter(|rule| rule.is_active && &rule.field_id == field).collect();
        rules.sort_by_key(|rule| rule.priority);
        rules
    }

    /// Attaches a rule to a field whose type the rule applies to.
    fn create_validation_rule(
        &mut self,
        collection: &str,
        field: &str,
        payload: &NewValidationRule,
    ) -> Result<ValidationRule, ApiError> {
        let field = self.field_by_name(collection, field)?.clone();
        let rule_type = payload.rule_type();
        if !rule_type.applies_to_field(&field) {
            let field_type = match &field.kind {
                FieldKind::Scalar(scalar) => scalar.as_str().to_string(),
                FieldKind::Relation(_) => "relation".to_string(),
            };
            return Err(detail(
                400,
                &format!("Rule type '{rule_type}' cannot be applied to field type '{field_type}'"),
            ));
        }
        let now = self.tick();
        let rule = ValidationRule {
            id: RuleId::new(self.mint("rule")),
            field_id: field.id,
            rule_type: rule_type.as_str().to_string(),
            config: payload.config().cloned(),
            error_message: payload.error_message().map(str::to_string),
            priority: payload.priority(),
            is_active: true,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        self.rules.push(rule.clone());
        Ok(rule)
    }

    /// Applies the set members of a rule patch.
    fn update_validation_rule(
        &mut self,
        id: &RuleId,
        patch: &RulePatch,
    ) -> Result<ValidationRule, ApiError> {
        let now = self.tick();
        let rule = self
            .rules
            .iter_mut()
            .find(|rule| &rule.id == id)
            .ok_or_else(|| detail(404, "Rule not found"))?;
        if let Some(config) = &patch.config {
            rule.config = if config.is_empty() { None } else { Some(config.clone()) };
        }
        if let Some(message) = &patch.error_message {
            rule.error_message = Some(message.clone());
        }
        if let Some(priority) = patch.priority {
            rule.priority = priority;
        }
        if let Some(active) = patch.is_active {
            rule.is_active = active;
        }
        rule.updated_at = Some(now);
        Ok(rule.clone())
    }

    /// Checks the given values against the active rules of their fields.
    fn rule_violations(
        &self,
        collection_id: &CollectionId,
        values: &Map<String, Value>,
    ) -> ValidationErrorSet {
        let mut errors = ValidationErrorSet::new();
        for field in self.fields_of(collection_id) {
            let Some(value) = field.value_in(values) else {
                continue;
            };
            for rule in self.active_rules(&field.id) {
                if let Some(message) = rules::violation(rule, value) {
                    errors.push(field.name.clone(), message);
                }
            }
        }
        errors
    }

    /// Converts a stored row into the read shape, dropping hidden fields.
    fn to_record(
        &self,
        collection_id: &CollectionId,
        row: &Map<String, Value>,
    ) -> Result<Record, ApiError> {
        let mut visible = row.clone();
        for field in self.fields_of(collection_id).iter().filter(|f| f.is_hidden) {
            visible.remove(storage_column(field));
        }
        serde_json::from_value(Value::Object(visible))
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Filters, sorts, and pages the rows of a collection.
    fn list_records(&self, collection: &str, query: &RecordQuery) -> Result<RecordPage, ApiError> {
        let collection_id = self.collection_by_name(collection)?.id.clone();
        let fields = self.fields_of(&collection_id);
        let mut rows: Vec<&Map<String, Value>> = self
            .rows(&collection_id)
            .iter()
            .filter(|row| query.filters.iter().all(|filter| filter_matches(fields, row, filter)))
            .collect();
        if !query.sort.is_empty() {
            rows.sort_by(|a, b| compare_rows(fields, &query.sort, a, b));
        }
        let total = u64::try_from(rows.len()).unwrap_or(u64::MAX);
        let records = rows
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .map(|row| self.to_record(&collection_id, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RecordPage {
            records,
            total,
            limit: Some(query.limit),
            offset: Some(query.offset),
        })
    }

    /// Validates a write payload and returns it keyed by storage column.
    fn check_values(
        &self,
        collection_id: &CollectionId,
        values: &Map<String, Value>,
        existing: Option<&RecordId>,
    ) -> Result<Map<String, Value>, ApiError> {
        let fields = self.fields_of(collection_id);
        let mut errors = ValidationErrorSet::new();
        let mut accepted = Map::new();
        for (key, value) in values {
            let Some(field) = fields
                .iter()
                .find(|f| &f.name == key || f.sql_column_name.as_deref() == Some(key.as_str()))
            else {
                errors.push(key.clone(), "Unknown field");
                continue;
            };
            if value.is_null() {
                if field.is_required {
                    errors.push(field.name.clone(), REQUIRED_MESSAGE);
                } else {
                    accepted.insert(storage_column(field).to_string(), Value::Null);
                }
                continue;
            }
            match self.coerce_value(collection_id, field, value, existing) {
                Ok(stored) => {
                    accepted.insert(storage_column(field).to_string(), stored);
                }
                Err(message) => errors.push(field.name.clone(), message),
            }
        }
        if existing.is_none() {
            for field in fields.iter().filter(|f| f.is_required) {
                if field.value_in(values).is_none() && !errors.has_errors(&field.name) {
                    errors.push(field.name.clone(), REQUIRED_MESSAGE);
                }
            }
        }
        for (field, messages) in self.rule_violations(collection_id, values).iter() {
            if !errors.has_errors(field) {
                for message in messages {
                    errors.push(field, message.clone());
                }
            }
        }
        if errors.is_empty() { Ok(accepted) } else { Err(validation_rejection(&errors)) }
    }

    /// Checks one non-null value against its field and returns the stored form.
    fn coerce_value(
        &self,
        collection_id: &CollectionId,
        field: &Field,
        value: &Value,
        existing: Option<&RecordId>,
    ) -> Result<Value, &'static str> {
        let stored = match &field.kind {
            FieldKind::Scalar(ScalarType::Int) => {
                value.as_i64().map(Value::from).ok_or("Must be a whole number")?
            }
            FieldKind::Scalar(ScalarType::Float) => {
                if value.is_number() {
                    value.clone()
                } else {
                    return Err("Must be a number");
                }
            }
            FieldKind::Scalar(ScalarType::Bool) => {
                if value.is_boolean() {
                    value.clone()
                } else {
                    return Err("Must be true or false");
                }
            }
            FieldKind::Scalar(_) => {
                if value.is_string() {
                    value.clone()
                } else {
                    return Err("Must be text");
                }
            }
            FieldKind::Relation(spec) => {
                let id = RecordId::from_json(value).ok_or("Must be a record identifier")?;
                let target = self
                    .rows(&spec.target_collection_id)
                    .iter()
                    .find(|row| row_matches_id(row, &id))
                    .ok_or("Referenced record does not exist")?;
                target.get("id").cloned().unwrap_or(Value::Null)
            }
        };
        if field.is_unique {
            let column = storage_column(field);
            let taken = self.rows(collection_id).iter().any(|row| {
                row.get(column) == Some(&stored)
                    && existing.is_none_or(|id| !row_matches_id(row, id))
            });
            if taken {
                return Err("Value must be unique");
            }
        }
        Ok(stored)
    }

    /// Inserts a validated row and emits `record.created`.
    fn create_record(
        &mut self,
        collection: &str,
        values: &Map<String, Value>,
    ) -> Result<Record, ApiError> {
        let collection_id = self.collection_by_name(collection)?.id.clone();
        let accepted = self.check_values(&collection_id, values, None)?;
        let now = self.tick();
        let stored = self.records.entry(collection_id.clone()).or_default();
        stored.last_id += 1;
        let mut row = Map::new();
        row.insert("id".to_string(), Value::from(stored.last_id));
        row.insert("created_at".to_string(), Value::String(now.clone()));
        row.insert("updated_at".to_string(), Value::String(now));
        row.extend(accepted);
        stored.rows.push(row.clone());
        self.emit(WebhookEvent::RecordCreated);
        self.to_record(&collection_id, &row)
    }

    /// Merges validated values into a row and emits `record.updated`.
    fn update_record(
        &mut self,
        collection: &str,
        id: &RecordId,
        values: &Map<String, Value>,
    ) -> Result<Record, ApiError> {
        let collection_id = self.collection_by_name(collection)?.id.clone();
        if !self.rows(&collection_id).iter().any(|row| row_matches_id(row, id)) {
            return Err(detail(404, "Record not found"));
        }
        let accepted = self.check_values(&collection_id, values, Some(id))?;
        let now = self.tick();
        let stored = self.records.entry(collection_id.clone()).or_default();
        let row = stored
            .rows
            .iter_mut()
            .find(|row| row_matches_id(row, id))
            .ok_or_else(|| detail(404, "Record not found"))?;
        row.extend(accepted);
        row.insert("updated_at".to_string(), Value::String(now));
        let row = row.clone();
        self.emit(WebhookEvent::RecordUpdated);
        self.to_record(&collection_id, &row)
    }

    /// Deletes a record and applies on-delete actions of incoming relations.
    fn delete_record(&mut self, collection: &str, id: &RecordId) -> Result<(), ApiError> {
        let collection_id = self.collection_by_name(collection)?.id.clone();
        if !self.rows(&collection_id).iter().any(|row| row_matches_id(row, id)) {
            return Err(detail(404, "Record not found"));
        }
        let mut doomed: Vec<(CollectionId, String)> = vec![(collection_id, id.to_string())];
        let mut nulled: Vec<(CollectionId, String, String)> = Vec::new();
        let mut cursor = 0;
        while let Some((target, target_id)) = doomed.get(cursor).cloned() {
            cursor += 1;
            for (source, fields) in &self.fields {
                for field in fields {
                    let Some(spec) = field.relation() else {
                        continue;
                    };
                    if spec.target_collection_id != target {
                        continue;
                    }
                    let column = storage_column(field);
                    for row in self.rows(source) {
                        if !cell_is(row, column, &target_id) {
                            continue;
                        }
                        let row_id = row.get("id").and_then(scalar_text).unwrap_or_default();
                        match spec.on_delete {
                            OnDeleteAction::Restrict => {
                                let source_name = self
                                    .collection_by_id(source)
                                    .map_or_else(|_| source.to_string(), |c| c.name.clone());
                                return Err(detail(
                                    409,
                                    &format!(
                                        "Record is referenced by {source_name}.{} (RESTRICT)",
                                        field.name
                                    ),
                                ));
                            }
                            OnDeleteAction::Cascade => {
                                let entry = (source.clone(), row_id);
                                if !doomed.contains(&entry) {
                                    doomed.push(entry);
                                }
                            }
                            OnDeleteAction::SetNull => {
                                nulled.push((source.clone(), row_id, column.to_string()));
                            }
                        }
                    }
                }
            }
        }
        for (source, row_id, column) in nulled {
            if let Some(stored) = self.records.get_mut(&source)
                && let Some(row) = stored
                    .rows
                    .iter_mut()
                    .find(|row| cell_is(row, "id", &row_id))
            {
                row.insert(column, Value::Null);
            }
        }
        for (source, row_id) in &doomed {
            if let Some(stored) = self.records.get_mut(source) {
                stored.rows.retain(|row| !cell_is(row, "id", row_id));
            }
        }
        self.emit(WebhookEvent::RecordDeleted);
        Ok(())
    }

    /// Stores a webhook with a hashed secret and returns the plain secret once.
    fn create_webhook(
        &mut self,
        project: &ProjectId,
        payload: &NewWebhook,
    ) -> Result<WebhookCreated, ApiError> {
        let secret = generate_secret();
        let now = self.tick();
        let webhook = Webhook {
            id: WebhookId::new(self.mint("wh")),
            project_id: Some(project.clone()),
            name: payload.name().to_string(),
            url: payload.url().to_string(),
            events: payload.events().iter().copied().map(SubscribedEvent::from).collect(),
            is_active: true,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        self.webhooks.push(StoredWebhook {
            webhook: webhook.clone(),
            secret_hash: hash_secret(&secret),
        });
        Ok(WebhookCreated {
            webhook,
            secret: WebhookSecret::new(secret),
        })
    }

    /// Appends pending deliveries for every active webhook subscribed to `event`.
    fn emit(&mut self, event: WebhookEvent) {
        let targets: Vec<WebhookId> = self
            .webhooks
            .iter()
            .filter(|stored| stored.webhook.is_active)
            .filter(|stored| stored.webhook.events.iter().any(|e| e.covers(event)))
            .map(|stored| stored.webhook.id.clone())
            .collect();
        for webhook_id in targets {
            let now = self.tick();
            let delivery = WebhookDelivery {
                id: DeliveryId::new(self.mint("dlv")),
                event_type: event.as_str().to_string(),
                status: "pending".to_string(),
                attempts: 0,
                response_status: None,
                error: None,
                created_at: Some(now),
                delivered_at: None,
            };
            self.deliveries.entry(webhook_id).or_default().push(delivery);
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a `{"detail": message}` error response.
fn detail(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        body: json!({ "detail": message }).to_string(),
    }
}

/// Builds a `400 {"detail": {"validation_errors": ...}}` response.
fn validation_rejection(errors: &ValidationErrorSet) -> ApiError {
    ApiError::Status {
        status: 400,
        body: json!({ "detail": { "validation_errors": errors } }).to_string(),
    }
}

/// Returns the storage column of a field.
fn storage_column(field: &Field) -> &str {
    field.sql_column_name.as_deref().unwrap_or(&field.name)
}

/// Renders a JSON scalar as comparison text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Returns true when the row's `column` renders as `expected`.
fn cell_is(row: &Map<String, Value>, column: &str, expected: &str) -> bool {
    row.get(column).and_then(scalar_text).as_deref() == Some(expected)
}

/// Returns true when the row's id renders the same as `id`.
fn row_matches_id(row: &Map<String, Value>, id: &RecordId) -> bool {
    row.get("id").and_then(scalar_text).is_some_and(|text| text == id.to_string())
}

/// Resolves a filter or sort field name to its storage column.
fn column_for<'a>(fields: &'a [Field], name: &'a str) -> &'a str {
    fields.iter().find(|f| f.name == name).map_or(name, storage_column)
}

/// Compares a stored value with raw query text, numerically when possible.
fn compare_to_text(actual: &Value, raw: &str) -> Option<Ordering> {
    if let (Some(left), Ok(right)) = (actual.as_f64(), raw.parse::<f64>()) {
        return left.partial_cmp(&right);
    }
    scalar_text(actual).map(|text| text.as_str().cmp(raw))
}

/// Evaluates one list filter against a row.
fn filter_matches(fields: &[Field], row: &Map<String, Value>, filter: &RecordFilter) -> bool {
    let actual = row.get(column_for(fields, &filter.field)).filter(|value| !value.is_null());
    let text = actual.and_then(scalar_text);
    let raw = filter.value.as_str();
    let in_list = || raw.split(',').any(|item| text.as_deref() == Some(item.trim()));
    let ordering = || actual.and_then(|value| compare_to_text(value, raw));
    match filter.op {
        FilterOperator::Eq => ordering() == Some(Ordering::Equal),
        FilterOperator::Neq => ordering() != Some(Ordering::Equal),
        FilterOperator::Gt => ordering() == Some(Ordering::Greater),
        FilterOperator::Gte => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        FilterOperator::Lt => ordering() == Some(Ordering::Less),
        FilterOperator::Lte => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        FilterOperator::Contains => text.as_deref().is_some_and(|t| t.contains(raw)),
        FilterOperator::StartsWith => text.as_deref().is_some_and(|t| t.starts_with(raw)),
        FilterOperator::EndsWith => text.as_deref().is_some_and(|t| t.ends_with(raw)),
        FilterOperator::ILike => {
            let needle = raw.trim_matches('%').to_lowercase();
            text.as_deref().is_some_and(|t| t.to_lowercase().contains(&needle))
        }
        FilterOperator::In => in_list(),
        FilterOperator::NotIn => !in_list(),
        FilterOperator::IsNull => actual.is_none(),
        FilterOperator::IsNotNull => actual.is_some(),
    }
}

/// Orders two rows by the given sort keys; missing values sort first.
fn compare_rows(
    fields: &[Field],
    keys: &[SortKey],
    left: &Map<String, Value>,
    right: &Map<String, Value>,
) -> Ordering {
    for key in keys {
        let column = column_for(fields, &key.field);
        let a = left.get(column).filter(|value| !value.is_null());
        let b = right.get(column).filter(|value| !value.is_null());
        let ordering = match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => scalar_text(a).cmp(&scalar_text(b)),
            },
        };
        let ordering = if key.descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Relation options the service advertises.
fn advertised_relation_options() -> RelationOptions {
    let option = |value: &str, label: &str, description: &str| RelationOption {
        value: value.to_string(),
        label: label.to_string(),
        description: Some(description.to_string()),
    };
    RelationOptions {
        relation_types: vec![option("many_to_one", "Many to One", "e.g., Order → Customer")],
        on_delete_actions: vec![
            option("RESTRICT", "Restrict", "Prevent deletion if referenced"),
            option("CASCADE", "Cascade", "Delete related records"),
            option("SET NULL", "Set Null", "Set reference to null"),
        ],
    }
}

/// Generates a random webhook signing secret.
fn generate_secret() -> String {
    let mut bytes = [0u8; WEBHOOK_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("{WEBHOOK_SECRET_PREFIX}{}", hex_encode(&bytes))
}

/// Hashes a webhook secret for storage.
fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    /// Lowercase hex digits.
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[usize::from(byte >> 4)] as char);
        out.push(HEX[usize::from(byte & 0x0f)] as char);
    }
    out
}
