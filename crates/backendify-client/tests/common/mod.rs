// crates/backendify-client/tests/common/mod.rs
// ============================================================================
// Module: Client Test Helpers
// Description: Shared fixtures for HTTP and in-memory client tests.
// Purpose: Provide one-shot local servers and seeded in-memory services.
// Dependencies: backendify-client, backendify-core, tiny_http
// ============================================================================

//! ## Overview
//! `serve_once` answers exactly one request with a canned response and hands
//! back what the client sent. `blog_service` seeds the posts/categories schema
//! used across the in-memory tests.

use std::thread;
use std::time::Duration;

use backendify_client::HttpApiClient;
use backendify_client::HttpApiConfig;
use backendify_client::InMemoryApi;
use backendify_core::CollectionId;
use backendify_core::NewCollection;
use backendify_core::NewField;
use backendify_core::NewRelationField;
use backendify_core::OnDeleteAction;
use backendify_core::ProjectId;
use backendify_core::RemoteApi;
use backendify_core::ScalarType;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Request observed by a one-shot server.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// HTTP method.
    pub method: String,
    /// Request URL including query.
    pub url: String,
    /// Request headers, lowercase names.
    pub headers: Vec<(String, String)>,
    /// Request body text.
    pub body: String,
}

impl CapturedRequest {
    /// Returns the first header value with the given case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Canned response for a one-shot server.
pub struct CannedResponse {
    /// Response status.
    pub status: u16,
    /// Response body text.
    pub body: String,
    /// Extra response headers.
    pub headers: Vec<(&'static str, String)>,
}

impl CannedResponse {
    /// JSON response with the given status.
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: vec![("Content-Type", "application/json".to_string())],
        }
    }
}

/// Starts a server that answers one request and returns what it received.
pub fn serve_once(response: CannedResponse) -> (String, thread::JoinHandle<CapturedRequest>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).unwrap();
        let captured = CapturedRequest {
            method: request.method().to_string(),
            url: request.url().to_string(),
            headers: request
                .headers()
                .iter()
                .map(|header| (header.field.to_string(), header.value.to_string()))
                .collect(),
            body,
        };
        let mut reply = Response::from_string(response.body).with_status_code(response.status);
        for (name, value) in response.headers {
            let header = Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap();
            reply = reply.with_header(header);
        }
        let _ = request.respond(reply);
        captured
    });
    (format!("http://{addr}"), handle)
}

/// Builds a client config pointing at `base_url`.
pub fn client_config(base_url: &str) -> HttpApiConfig {
    HttpApiConfig {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        max_response_bytes: 64 * 1024,
        bearer_token: None,
        api_key: None,
    }
}

/// Builds an HTTP client pointing at `base_url`.
pub fn client_for(base_url: &str) -> HttpApiClient {
    HttpApiClient::new(client_config(base_url)).unwrap()
}

/// Project used by every in-memory fixture.
pub fn project() -> ProjectId {
    ProjectId::new("p1")
}

/// Collection ids of the seeded blog schema.
pub struct BlogSchema {
    /// Seeded `categories` collection id.
    pub categories: CollectionId,
    /// Seeded `posts` collection id.
    pub posts: CollectionId,
}

/// Seeds `categories(name)` and `posts(title, views, category -> categories)`.
pub async fn blog_service(
    on_delete: OnDeleteAction,
    category_required: bool,
) -> (InMemoryApi, BlogSchema) {
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
    (
        api,
        BlogSchema {
            categories: categories.id,
            posts: posts.id,
        },
    )
}
