// crates/backendify-core/src/core/mod.rs
// ============================================================================
// Module: Backendify Core Types
// Description: Domain model for schema, records, webhooks, and cache scopes.
// Purpose: Provide stable, serializable types shared by every Backendify crate.
// Dependencies: serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! Core types describe what the remote service exposes: collections, typed
//! fields, opaque records, webhooks, field validation rules, and the
//! validation error shape. The cache module names the scopes those entities
//! are cached under and which scopes a mutation stales.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cache;
pub mod errors;
pub mod identifiers;
pub mod record;
pub mod rules;
pub mod schema;
pub mod validation;
pub mod webhook;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::CacheKey;
pub use cache::CacheTag;
pub use cache::MutationKind;
pub use errors::MAX_DISPLAY_NAME_LENGTH;
pub use errors::MAX_MACHINE_NAME_LENGTH;
pub use errors::ModelError;
pub use errors::validate_display_name;
pub use errors::validate_machine_name;
pub use identifiers::CollectionId;
pub use identifiers::DeliveryId;
pub use identifiers::FieldId;
pub use identifiers::ProjectId;
pub use identifiers::RecordId;
pub use identifiers::RuleId;
pub use identifiers::WebhookId;
pub use record::Cell;
pub use record::CellValue;
pub use record::FilterOperator;
pub use record::MAX_PAGE_LIMIT;
pub use record::Record;
pub use record::RecordFilter;
pub use record::RecordPage;
pub use record::RecordQuery;
pub use record::SYSTEM_COLUMNS;
pub use record::SortKey;
pub use record::TypedRecord;
pub use rules::ConfigKind;
pub use rules::NewValidationRule;
pub use rules::RecordValidation;
pub use rules::RulePatch;
pub use rules::RuleType;
pub use rules::RuleTypeCatalog;
pub use rules::RuleTypeInfo;
pub use rules::ValidationRule;
pub use schema::Collection;
pub use schema::Field;
pub use schema::FieldKind;
pub use schema::NewCollection;
pub use schema::NewField;
pub use schema::NewRelationField;
pub use schema::OnDeleteAction;
pub use schema::RelationOption;
pub use schema::RelationOptions;
pub use schema::RelationSpec;
pub use schema::RelationType;
pub use schema::ReverseRelation;
pub use schema::ScalarType;
pub use validation::REQUIRED_MESSAGE;
pub use validation::ValidationErrorSet;
pub use webhook::NewWebhook;
pub use webhook::SubscribedEvent;
pub use webhook::Webhook;
pub use webhook::WebhookCreated;
pub use webhook::WebhookDelivery;
pub use webhook::WebhookEvent;
pub use webhook::WebhookSecret;
