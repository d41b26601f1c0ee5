// crates/backendify-console/tests/common/mod.rs
// ============================================================================
// Module: Console Test Helpers
// Description: Sessions over seeded in-memory services with recorded events.
// Purpose: Share fixtures across console integration tests.
// Dependencies: backendify-client, backendify-console, backendify-core
// ============================================================================

//! ## Overview
//! `blog_session` seeds `categories(name)` and
//! `posts(title, views, category -> categories)` and wraps the service in a
//! [`ConsoleSession`] whose events land in a [`RecordingSink`].

use std::sync::Arc;
use std::sync::Mutex;

use backendify_client::InMemoryApi;
use backendify_config::ConsoleConfig;
use backendify_console::ClientEvent;
use backendify_console::ClientEventSink;
use backendify_console::ConsoleSession;
use backendify_core::Collection;
use backendify_core::NewCollection;
use backendify_core::NewField;
use backendify_core::NewRelationField;
use backendify_core::OnDeleteAction;
use backendify_core::ProjectId;
use backendify_core::RemoteApi;
use backendify_core::ScalarType;
use serde_json::Map;
use serde_json::Value;

/// Sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    /// Events in arrival order.
    events: Mutex<Vec<ClientEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ClientEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns the events with the given `event` name.
    pub fn named(&self, name: &str) -> Vec<ClientEvent> {
        self.events().into_iter().filter(|event| event.event == name).collect()
    }
}

impl ClientEventSink for RecordingSink {
    fn record(&self, event: &ClientEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Seeded console fixture.
pub struct Fixture {
    /// Seeded in-memory service.
    pub api: InMemoryApi,
    /// Events recorded by the session.
    pub sink: Arc<RecordingSink>,
    /// Session over the service.
    pub session: ConsoleSession,
    /// Seeded `categories` collection.
    pub categories: Collection,
    /// Seeded `posts` collection.
    pub posts: Collection,
}

/// Project used by every fixture.
pub fn project() -> ProjectId {
    ProjectId::new("p1")
}

/// Seeds the blog schema and opens a session over it.
pub async fn blog_session(on_delete: OnDeleteAction, category_required: bool) -> Fixture {
    let api = InMemoryApi::new().with_project("p1");
    let p = project();
    let categories = api
        .create_collection(&p, &NewCollection::new("categories", "Categories").unwrap())
        .await
        .unwrap();
    let name = NewField::new("name", "Name", ScalarType::String).unwrap().required(true);
    api.create_field(&p, "categories", &name).await.unwrap();
    let posts =
        api.create_collection(&p, &NewCollection::new("posts", "Posts").unwrap()).await.unwrap();
    let title = NewField::new("title", "Title", ScalarType::String).unwrap().required(true);
    api.create_field(&p, "posts", &title).await.unwrap();
    let views = NewField::new("views", "Views", ScalarType::Int).unwrap();
    api.create_field(&p, "posts", &views).await.unwrap();
    let mut relation =
        NewRelationField::new("category", "Category", categories.id.clone()).unwrap();
    relation.on_delete = on_delete;
    relation.is_required = category_required;
    api.create_relation_field(&p, &posts.id, &relation).await.unwrap();

    let sink = Arc::new(RecordingSink::default());
    let session = ConsoleSession::new(
        Arc::new(api.clone()),
        p,
        ConsoleConfig::default(),
        Arc::clone(&sink) as Arc<dyn ClientEventSink>,
    );
    Fixture {
        api,
        sink,
        session,
        categories,
        posts,
    }
}

/// Builds a JSON object from key/value pairs.
pub fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(key, value)| ((*key).to_string(), value.clone())).collect()
}
