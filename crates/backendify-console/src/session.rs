// crates/backendify-console/src/session.rs
// ============================================================================
// Module: Console Session
// Description: Project-scoped bundle of API, cache, settings, and event sink.
// Purpose: Give every console component one shared context.
// Dependencies: backendify-core, backendify-config
// ============================================================================

//! ## Overview
//! A [`ConsoleSession`] pins a project and owns the query cache shared by the
//! registry, resolver, and coordinator it hands out. Components borrow the
//! session; none of them hold state of their own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use backendify_config::ConsoleConfig;
use backendify_core::CacheKey;
use backendify_core::CacheTag;
use backendify_core::ProjectId;
use backendify_core::RemoteApi;

use crate::cache::QueryCache;
use crate::mutations::MutationCoordinator;
use crate::queries::DataQueries;
use crate::registry::SchemaRegistry;
use crate::relations::RelationResolver;
use crate::telemetry::ClientEvent;
use crate::telemetry::ClientEventSink;

// ============================================================================
// SECTION: Session
// ============================================================================

/// Project-scoped console context.
pub struct ConsoleSession {
    /// Remote API backend.
    api: Arc<dyn RemoteApi>,
    /// Shared query cache.
    cache: QueryCache,
    /// Event sink.
    sink: Arc<dyn ClientEventSink>,
    /// Project scope for every call.
    project: ProjectId,
    /// Rendering and lookup settings.
    settings: ConsoleConfig,
}

impl ConsoleSession {
    /// Creates a session with an empty cache.
    #[must_use]
    pub fn new(
        api: Arc<dyn RemoteApi>,
        project: ProjectId,
        settings: ConsoleConfig,
        sink: Arc<dyn ClientEventSink>,
    ) -> Self {
        Self {
            api,
            cache: QueryCache::new(Arc::clone(&sink)),
            sink,
            project,
            settings,
        }
    }

    /// Returns the remote API backend.
    #[must_use]
    pub fn api(&self) -> &dyn RemoteApi {
        self.api.as_ref()
    }

    /// Returns the shared query cache.
    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Returns the project scope.
    #[must_use]
    pub const fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Returns the console settings.
    #[must_use]
    pub const fn settings(&self) -> &ConsoleConfig {
        &self.settings
    }

    /// Builds a cache key for an unparameterized query in this project.
    #[must_use]
    pub fn key(&self, tag: CacheTag) -> CacheKey {
        CacheKey::new(self.project.clone(), tag)
    }

    /// Records an event on the session sink.
    pub fn record(&self, event: &ClientEvent) {
        self.sink.record(event);
    }

    /// Returns the schema registry.
    #[must_use]
    pub const fn registry(&self) -> SchemaRegistry<'_> {
        SchemaRegistry::new(self)
    }

    /// Returns the record and webhook query helper.
    #[must_use]
    pub const fn queries(&self) -> DataQueries<'_> {
        DataQueries::new(self)
    }

    /// Returns the relation resolver.
    #[must_use]
    pub const fn resolver(&self) -> RelationResolver<'_> {
        RelationResolver::new(self)
    }

    /// Returns the mutation coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> MutationCoordinator<'_> {
        MutationCoordinator::new(self)
    }
}
