// crates/backendify-console/src/registry.rs
// ============================================================================
// Module: Schema Registry
// Description: Cached reads of collections, fields, relations, and field rules.
// Purpose: Discover the project schema at runtime, lazily and per collection.
// Dependencies: backendify-core, crate::cache
// ============================================================================

//! ## Overview
//! Every read goes through the session's [`crate::QueryCache`]. A failed
//! fetch leaves nothing cached for its key, so callers treat a missing
//! schema as unknown rather than empty. Fields are fetched only for the
//! collection asked about.

// ============================================================================
// SECTION: Imports
// ============================================================================

use backendify_core::ApiError;
use backendify_core::CacheKey;
use backendify_core::CacheTag;
use backendify_core::Collection;
use backendify_core::CollectionId;
use backendify_core::Field;
use backendify_core::RelationOptions;
use backendify_core::ReverseRelation;
use backendify_core::RuleTypeInfo;
use backendify_core::ValidationRule;

use crate::session::ConsoleSession;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Cached schema reads for one session.
#[derive(Clone, Copy)]
pub struct SchemaRegistry<'a> {
    /// Owning session.
    session: &'a ConsoleSession,
}

impl<'a> SchemaRegistry<'a> {
    /// Creates a registry over `session`.
    #[must_use]
    pub const fn new(session: &'a ConsoleSession) -> Self {
        Self {
            session,
        }
    }

    /// Lists the project's collections.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        let session = self.session;
        session
            .cache()
            .get_or_fetch(session.key(CacheTag::Collections), || {
                session.api().list_collections(session.project())
            })
            .await
    }

    /// Lists the fields of one collection by machine name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn list_fields(&self, collection: &str) -> Result<Vec<Field>, ApiError> {
        let session = self.session;
        session
            .cache()
            .get_or_fetch(session.key(CacheTag::Fields(collection.to_string())), || {
                session.api().list_fields(session.project(), collection)
            })
            .await
    }

    /// Finds a collection by id in the loaded collection list.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the collection list cannot be fetched.
    pub async fn find_collection_by_id(
        &self,
        id: &CollectionId,
    ) -> Result<Option<Collection>, ApiError> {
        let collections = self.list_collections().await?;
        Ok(collections.into_iter().find(|collection| &collection.id == id))
    }

    /// Finds a collection by machine name in the loaded collection list.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the collection list cannot be fetched.
    pub async fn find_collection_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Collection>, ApiError> {
        let collections = self.list_collections().await?;
        Ok(collections.into_iter().find(|collection| collection.name == name))
    }

    /// Lists the outgoing relation fields of a collection.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn list_relation_fields(&self, id: &CollectionId) -> Result<Vec<Field>, ApiError> {
        let session = self.session;
        session
            .cache()
            .get_or_fetch(session.key(CacheTag::Relations(id.clone())), || {
                session.api().list_relation_fields(session.project(), id)
            })
            .await
    }

    /// Lists relation fields of other collections that target this one.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn list_reverse_relations(
        &self,
        id: &CollectionId,
    ) -> Result<Vec<ReverseRelation>, ApiError> {
        let session = self.session;
        session
            .cache()
            .get_or_fetch(session.key(CacheTag::ReverseRelations(id.clone())), || {
                session.api().list_reverse_relations(session.project(), id)
            })
            .await
    }

    /// Returns the relation types and on-delete actions the service supports.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn relation_options(&self) -> Result<RelationOptions, ApiError> {
        let session = self.session;
        session
            .cache()
            .get_or_fetch(session.key(CacheTag::RelationOptions), || {
                session.api().relation_options(session.project())
            })
            .await
    }

    /// Lists the active validation rules of one field.
    ///
    /// Rules are cached under the collection's rule tag with the field name as
    /// the variant.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn list_rules(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Vec<ValidationRule>, ApiError> {
        let session = self.session;
        let key = CacheKey::with_variant(
            session.project().clone(),
            CacheTag::Rules(collection.to_string()),
            field,
        );
        session
            .cache()
            .get_or_fetch(key, || {
                session.api().list_validation_rules(session.project(), collection, field)
            })
            .await
    }

    /// Returns the validation rule types the service supports.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the fetch fails.
    pub async fn rule_types(&self) -> Result<Vec<RuleTypeInfo>, ApiError> {
        let session = self.session;
        session
            .cache()
            .get_or_fetch(session.key(CacheTag::RuleTypes), || {
                session.api().rule_types(session.project())
            })
            .await
    }
}
