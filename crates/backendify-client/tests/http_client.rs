// crates/backendify-client/tests/http_client.rs
// ============================================================================
// Module: HTTP Client Tests
// Description: Request shaping and response handling of the reqwest backend.
// Purpose: Verify paths, credentials, status passthrough, and size limits.
// Dependencies: backendify-client, backendify-core, tiny_http, tokio
// ============================================================================

//! ## Overview
//! Each test runs a one-shot local server, issues one call through
//! [`HttpApiClient`], and inspects both the captured request and the result.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use backendify_client::HttpApiClient;
use backendify_core::ApiError;
use backendify_core::CollectionId;
use backendify_core::FilterOperator;
use backendify_core::NewValidationRule;
use backendify_core::NewWebhook;
use backendify_core::RecordId;
use backendify_core::RecordQuery;
use backendify_core::RemoteApi;
use backendify_core::RuleId;
use backendify_core::RulePatch;
use backendify_core::RuleType;
use backendify_core::SubscribedEvent;
use backendify_core::WebhookEvent;
use backendify_core::WebhookId;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::common::CannedResponse;
use crate::common::client_config;
use crate::common::client_for;
use crate::common::project;
use crate::common::serve_once;

#[tokio::test]
async fn list_records_sends_page_sort_and_filters_in_query() {
    let (base, handle) = serve_once(CannedResponse::json(
        200,
        concat!(
            r#"{"records":[{"id":1,"title":"hello","created_at":"t1"}],"#,
            r#""total":1,"limit":50,"offset":0}"#
        ),
    ));
    let client = client_for(&base);
    let query = RecordQuery::page(50, 0)
        .sort_by("created_at", true)
        .filter("title", FilterOperator::Contains, "a b")
        .filter("views", FilterOperator::Eq, "3");

    let page = client.list_records(&project(), "posts", &query).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.method, "GET");
    assert_eq!(
        captured.url,
        "/api/projects/p1/data/posts?limit=50&offset=0&sort=-created_at&title__contains=a+b&views=3"
    );
    assert_eq!(captured.header("accept"), Some("application/json"));
    assert_eq!(page.total, 1);
    assert!(page.contains(&RecordId::Int(1)));
}

#[tokio::test]
async fn path_segments_are_percent_encoded() {
    let (base, handle) = serve_once(CannedResponse::json(200, r#"{"id":"a/b","created_at":null}"#));
    let client = client_for(&base);

    let id = RecordId::Text("a/b".to_string());
    let record = client.get_record(&project(), "posts", &id).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.url, "/api/projects/p1/data/posts/a%2Fb");
    assert_eq!(record.id, RecordId::Text("a/b".to_string()));
}

#[tokio::test]
async fn base_url_path_prefix_is_preserved() {
    let (base, handle) = serve_once(CannedResponse::json(200, "[]"));
    let client = client_for(&format!("{base}/backend/"));

    let collections = client.list_collections(&project()).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.url, "/backend/api/projects/p1/schema/collections");
    assert!(collections.is_empty());
}

#[tokio::test]
async fn credentials_are_sent_as_headers() {
    let (base, handle) = serve_once(CannedResponse::json(200, "[]"));
    let mut config = client_config(&base);
    config.bearer_token = Some("tok-123".to_string());
    config.api_key = Some("key-456".to_string());
    let client = HttpApiClient::new(config).unwrap();

    client.list_webhooks(&project()).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.header("authorization"), Some("Bearer tok-123"));
    assert_eq!(captured.header("x-api-key"), Some("key-456"));
}

#[tokio::test]
async fn create_record_posts_values_verbatim() {
    let body = r#"{"id":7,"title":"x","category_id":3,"created_at":"t9"}"#;
    let (base, handle) = serve_once(CannedResponse::json(201, body));
    let client = client_for(&base);
    let mut values = Map::new();
    values.insert("title".to_string(), json!("x"));
    values.insert("category_id".to_string(), json!(3));

    let record = client.create_record(&project(), "posts", &values).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.method, "POST");
    assert_eq!(captured.url, "/api/projects/p1/data/posts");
    assert_eq!(captured.header("content-type"), Some("application/json"));
    let sent: Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(sent, json!({"title": "x", "category_id": 3}));
    assert_eq!(record.id, RecordId::Int(7));
    assert_eq!(record.get("category_id"), Some(&json!(3)));
}

#[tokio::test]
async fn update_record_uses_patch() {
    let (base, handle) = serve_once(CannedResponse::json(200, r#"{"id":7,"title":"y"}"#));
    let client = client_for(&base);
    let mut values = Map::new();
    values.insert("title".to_string(), json!("y"));

    client.update_record(&project(), "posts", &RecordId::Int(7), &values).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.method, "PATCH");
    assert_eq!(captured.url, "/api/projects/p1/data/posts/7");
}

#[tokio::test]
async fn delete_record_accepts_empty_no_content() {
    let (base, handle) = serve_once(CannedResponse {
        status: 204,
        body: String::new(),
        headers: Vec::new(),
    });
    let client = client_for(&base);

    client.delete_record(&project(), "posts", &RecordId::Int(7)).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.method, "DELETE");
    assert_eq!(captured.url, "/api/projects/p1/data/posts/7");
}

#[tokio::test]
async fn rejection_body_is_preserved_in_status_error() {
    let body = r#"{"detail":{"validation_errors":{"title":["This field is required"]}}}"#;
    let (base, handle) = serve_once(CannedResponse::json(400, body));
    let client = client_for(&base);

    let err = client.create_record(&project(), "posts", &Map::new()).await.unwrap_err();
    handle.join().unwrap();

    assert_eq!(
        err,
        ApiError::Status {
            status: 400,
            body: body.to_string(),
        }
    );
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let big = format!("[{}]", vec!["1"; 40_000].join(","));
    let (base, handle) = serve_once(CannedResponse::json(200, &big));
    let mut config = client_config(&base);
    config.max_response_bytes = 1024;
    let client = HttpApiClient::new(config).unwrap();

    let err = client.list_collections(&project()).await.unwrap_err();
    handle.join().unwrap();

    assert!(matches!(err, ApiError::ResponseTooLarge { limit: 1024, .. }), "{err:?}");
}

#[tokio::test]
async fn redirects_are_not_followed() {
    let (base, handle) = serve_once(CannedResponse {
        status: 302,
        body: String::new(),
        headers: vec![("Location", "http://127.0.0.1:1/elsewhere".to_string())],
    });
    let client = client_for(&base);

    let err = client.list_collections(&project()).await.unwrap_err();
    handle.join().unwrap();

    assert_eq!(err.status(), Some(302));
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let (base, handle) = serve_once(CannedResponse::json(200, "{not json"));
    let client = client_for(&base);

    let err = client.relation_options(&project()).await.unwrap_err();
    handle.join().unwrap();

    assert!(matches!(err, ApiError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn reverse_relations_use_collection_id_path() {
    let (base, handle) = serve_once(CannedResponse::json(
        200,
        concat!(
            r#"[{"id":"f1","name":"category","display_name":"Category","#,
            r#""source_collection_id":"c2","source_collection_name":"posts"}]"#
        ),
    ));
    let client = client_for(&base);

    let edges = client.list_reverse_relations(&project(), &CollectionId::new("c1")).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.url, "/api/projects/p1/schema/relations/collections/c1/reverse-relations");
    assert_eq!(edges[0].edge_label(), "posts.category");
}

#[tokio::test]
async fn created_webhook_exposes_secret_once() {
    let (base, handle) = serve_once(CannedResponse::json(
        201,
        concat!(
            r#"{"id":"wh1","name":"hook","url":"https://example.test/h","#,
            r#""events":["record.created"],"is_active":true,"secret":"s3cret"}"#
        ),
    ));
    let client = client_for(&base);
    let events = vec![WebhookEvent::RecordCreated];
    let payload = NewWebhook::new("hook", "https://example.test/h", events).unwrap();

    let created = client.create_webhook(&project(), &payload).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.url, "/api/projects/p1/webhooks");
    let sent: Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(sent["events"], json!(["record.created"]));
    assert_eq!(created.webhook.id, WebhookId::new("wh1"));
    assert_eq!(created.secret.expose(), "s3cret");
    assert!(!format!("{:?}", created.secret).contains("s3cret"));
}

#[tokio::test]
async fn webhook_list_decodes_events_outside_the_catalog() {
    let (base, handle) = serve_once(CannedResponse::json(
        200,
        r#"[{"id":"wh1","name":"a","url":"https://x.test/a","events":["record.created"]},
            {"id":"wh2","name":"b","url":"https://x.test/b","events":["collection.created"]}]"#,
    ));
    let client = client_for(&base);

    let hooks = client.list_webhooks(&project()).await.unwrap();
    handle.join().unwrap();

    assert_eq!(hooks.len(), 2);
    assert_eq!(hooks[0].events, vec![SubscribedEvent::Known(WebhookEvent::RecordCreated)]);
    assert_eq!(hooks[1].events, vec![SubscribedEvent::Other("collection.created".to_string())]);
}

#[tokio::test]
async fn validation_rules_use_field_scoped_path() {
    let (base, handle) = serve_once(CannedResponse::json(
        201,
        r#"{"id":"r1","field_id":"f1","rule_type":"min_length","config":{"min":3},
            "error_message":"Too short","priority":1,"is_active":true,
            "created_at":"t1","updated_at":"t1"}"#,
    ));
    let client = client_for(&base);
    let mut config = Map::new();
    config.insert("min".to_string(), json!(3));
    let payload = NewValidationRule::new(RuleType::MinLength)
        .with_config(config)
        .unwrap()
        .with_message("Too short")
        .with_priority(1);

    let rule = client.create_validation_rule(&project(), "posts", "title", &payload).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.method, "POST");
    assert_eq!(captured.url, "/api/projects/p1/validations/collections/posts/fields/title/rules");
    let sent: Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(
        sent,
        json!({
            "rule_type": "min_length",
            "config": {"min": 3},
            "error_message": "Too short",
            "priority": 1
        })
    );
    assert_eq!(rule.kind(), Some(RuleType::MinLength));
}

#[tokio::test]
async fn rule_patch_and_delete_address_the_rule_id() {
    let (base, handle) = serve_once(CannedResponse::json(
        200,
        concat!(
            r#"{"id":"r1","field_id":"f1","rule_type":"email","config":null,"#,
            r#""priority":0,"is_active":false}"#
        ),
    ));
    let client = client_for(&base);
    let patch = RulePatch {
        is_active: Some(false),
        ..RulePatch::default()
    };

    let rule = client.update_validation_rule(&project(), &RuleId::new("r1"), &patch).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.method, "PATCH");
    assert_eq!(captured.url, "/api/projects/p1/validations/rules/r1");
    assert_eq!(serde_json::from_str::<Value>(&captured.body).unwrap(), json!({"is_active": false}));
    assert!(!rule.is_active);

    let (base, handle) = serve_once(CannedResponse {
        status: 204,
        body: String::new(),
        headers: Vec::new(),
    });
    client_for(&base).delete_validation_rule(&project(), &RuleId::new("r1")).await.unwrap();
    let captured = handle.join().unwrap();
    assert_eq!(captured.method, "DELETE");
    assert_eq!(captured.url, "/api/projects/p1/validations/rules/r1");
}

#[tokio::test]
async fn dry_run_validation_wraps_values_in_data() {
    let (base, handle) = serve_once(CannedResponse::json(
        200,
        r#"{"is_valid":false,"errors":{"title":["Must be at least 3 characters"]}}"#,
    ));
    let client = client_for(&base);
    let mut values = Map::new();
    values.insert("title".to_string(), json!("ab"));

    let result = client.validate_record(&project(), "posts", &values).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.method, "POST");
    assert_eq!(captured.url, "/api/projects/p1/validations/collections/posts/validate");
    let sent: Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(sent, json!({"data": {"title": "ab"}}));
    assert!(!result.is_valid);
    assert_eq!(result.errors.messages("title"), ["Must be at least 3 characters".to_string()]);
}

#[tokio::test]
async fn rule_types_unwrap_the_catalog_envelope() {
    let (base, handle) = serve_once(CannedResponse::json(
        200,
        r#"{"rule_types":[{"type":"email","applies_to":["string"],"config_schema":{}}]}"#,
    ));
    let client = client_for(&base);

    let types = client.rule_types(&project()).await.unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.url, "/api/projects/p1/validations/rule-types");
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].rule_type, "email");
}

#[test]
fn non_http_base_url_is_a_config_error() {
    let err = HttpApiClient::new(client_config("ftp://example.test")).unwrap_err();
    assert!(matches!(err, ApiError::Config(_)));
}
