// crates/backendify-client/src/http.rs
// ============================================================================
// Module: Backendify HTTP Client
// Description: reqwest-backed implementation of the remote API contract.
// Purpose: Issue project-scoped JSON requests with size limits and no redirects.
// Dependencies: reqwest, serde_json, url, backendify-core, backendify-config
// ============================================================================

//! ## Overview
//! [`HttpApiClient`] maps each [`RemoteApi`] operation to one HTTP request
//! under `{base_url}/api/projects/{project}`. Path segments are percent-encoded
//! individually, response bodies are read with a hard byte limit, and
//! non-success statuses surface as [`ApiError::Status`] with the raw body so
//! structured validation errors survive intact.
//!
//! Security posture: server responses are untrusted; credentials are marked
//! sensitive on the header map and never appear in `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use backendify_config::ApiConfig;
use backendify_core::ApiError;
use backendify_core::Collection;
use backendify_core::CollectionId;
use backendify_core::Field;
use backendify_core::NewCollection;
use backendify_core::NewField;
use backendify_core::NewRelationField;
use backendify_core::NewValidationRule;
use backendify_core::NewWebhook;
use backendify_core::ProjectId;
use backendify_core::Record;
use backendify_core::RecordId;
use backendify_core::RecordPage;
use backendify_core::RecordQuery;
use backendify_core::RecordValidation;
use backendify_core::RelationOptions;
use backendify_core::RemoteApi;
use backendify_core::ReverseRelation;
use backendify_core::RuleId;
use backendify_core::RulePatch;
use backendify_core::RuleTypeCatalog;
use backendify_core::RuleTypeInfo;
use backendify_core::ValidationRule;
use backendify_core::Webhook;
use backendify_core::WebhookCreated;
use backendify_core::WebhookDelivery;
use backendify_core::WebhookId;
use reqwest::Client;
use reqwest::Method;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying a pre-issued API key.
const API_KEY_HEADER: &str = "x-api-key";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// HTTP client settings.
#[derive(Clone)]
pub struct HttpApiConfig {
    /// Service base URL.
    pub base_url: String,
    /// Total request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Maximum response body size in bytes.
    pub max_response_bytes: usize,
    /// Optional bearer token.
    pub bearer_token: Option<String>,
    /// Optional API key.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for HttpApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl From<&ApiConfig> for HttpApiConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim().to_string(),
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            max_response_bytes: config.max_response_bytes,
            bearer_token: config.bearer_token.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// HTTP implementation of [`RemoteApi`].
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    /// Shared reqwest client.
    client: Client,
    /// Parsed base URL.
    base_url: Url,
    /// Default headers including credentials.
    headers: HeaderMap,
    /// Maximum response body size in bytes.
    max_response_bytes: usize,
}

impl HttpApiClient {
    /// Builds a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the base URL or credentials are
    /// unusable, or [`ApiError::Transport`] when the client cannot be built.
    pub fn new(config: HttpApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| ApiError::Config(format!("invalid base url: {err}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::Config("base url must be an http(s) url".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let headers = default_headers(config.bearer_token.as_deref(), config.api_key.as_deref())?;
        Ok(Self {
            client,
            base_url,
            headers,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// Builds a client from the `[api]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(HttpApiConfig::from(config))
    }

    /// Builds a project-scoped endpoint URL from raw path segments.
    fn endpoint(&self, project: &ProjectId, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::Config("base url cannot carry a path".to_string()))?;
            path.pop_if_empty();
            path.extend(["api", "projects", project.as_str()]);
            path.extend(segments);
        }
        Ok(url)
    }

    /// Sends a request and returns the success body.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ApiError> {
        let mut request = self.client.request(method, url).headers(self.headers.clone());
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }
        let response = request.send().await.map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        let bytes = read_response_body_with_limit(response, self.max_response_bytes).await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }

    /// Issues a GET and decodes the JSON response.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let bytes = self.send(Method::GET, url, None).await?;
        decode_json(&bytes)
    }

    /// Issues a request with a JSON body and decodes the JSON response.
    async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::Decode(format!("request serialization failed: {err}")))?;
        let bytes = self.send(method, url, Some(payload)).await?;
        decode_json(&bytes)
    }
}

#[async_trait]
impl RemoteApi for HttpApiClient {
    async fn list_collections(&self, project: &ProjectId) -> Result<Vec<Collection>, ApiError> {
        let url = self.endpoint(project, &["schema", "collections"])?;
        self.get_json(url).await
    }

    async fn create_collection(
        &self,
        project: &ProjectId,
        payload: &NewCollection,
    ) -> Result<Collection, ApiError> {
        let url = self.endpoint(project, &["schema", "collections"])?;
        self.send_json(Method::POST, url, payload).await
    }

    async fn list_fields(
        &self,
        project: &ProjectId,
        collection: &str,
    ) -> Result<Vec<Field>, ApiError> {
        let url = self.endpoint(project, &["schema", "collections", collection, "fields"])?;
        self.get_json(url).await
    }

    async fn create_field(
        &self,
        project: &ProjectId,
        collection: &str,
        payload: &NewField,
    ) -> Result<Field, ApiError> {
        let url = self.endpoint(project, &["schema", "collections", collection, "fields"])?;
        self.send_json(Method::POST, url, payload).await
    }

    async fn list_records(
        &self,
        project: &ProjectId,
        collection: &str,
        query: &RecordQuery,
    ) -> Result<RecordPage, ApiError> {
        let mut url = self.endpoint(project, &["data", collection])?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.query_pairs() {
                pairs.append_pair(&key, &value);
            }
        }
        self.get_json(url).await
    }

    async fn get_record(
        &self,
        project: &ProjectId,
        collection: &str,
        id: &RecordId,
    ) -> Result<Record, ApiError> {
        let id = id.to_string();
        let url = self.endpoint(project, &["data", collection, id.as_str()])?;
        self.get_json(url).await
    }

    async fn create_record(
        &self,
        project: &ProjectId,
        collection: &str,
        values: &Map<String, Value>,
    ) -> Result<Record, ApiError> {
        let url = self.endpoint(project, &["data", collection])?;
        self.send_json(Method::POST, url, values).await
    }

    async fn update_record(
        &self,
        project: &ProjectId,
        collection: &str,
        id: &RecordId,
        values: &Map<String, Value>,
    ) -> Result<Record, ApiError> {
        let id = id.to_string();
        let url = self.endpoint(project, &["data", collection, id.as_str()])?;
        self.send_json(Method::PATCH, url, values).await
    }

    async fn delete_record(
        &self,
        project: &ProjectId,
        collection: &str,
        id: &RecordId,
    ) -> Result<(), ApiError> {
        let id = id.to_string();
        let url = self.endpoint(project, &["data", collection, id.as_str()])?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn list_relation_fields(
        &self,
        project: &ProjectId,
        collection_id: &CollectionId,
    ) -> Result<Vec<Field>, ApiError> {
        let url = self.endpoint(
            project,
            &["schema", "relations", "collections", collection_id.as_str(), "relations"],
        )?;
        self.get_json(url).await
    }

    async fn create_relation_field(
        &self,
        project: &ProjectId,
        collection_id: &CollectionId,
        payload: &NewRelationField,
    ) -> Result<Field, ApiError> {
        let url = self.endpoint(
            project,
            &["schema", "relations", "collections", collection_id.as_str(), "relations"],
        )?;
        self.send_json(Method::POST, url, payload).await
    }

    async fn list_reverse_relations(
        &self,
        project: &ProjectId,
        collection_id: &CollectionId,
    ) -> Result<Vec<ReverseRelation>, ApiError> {
        let url = self.endpoint(
            project,
            &["schema", "relations", "collections", collection_id.as_str(), "reverse-relations"],
        )?;
        self.get_json(url).await
    }

    async fn relation_options(&self, project: &ProjectId) -> Result<RelationOptions, ApiError> {
        let url = self.endpoint(project, &["schema", "relations", "relation-options"])?;
        self.get_json(url).await
    }

    async fn list_webhooks(&self, project: &ProjectId) -> Result<Vec<Webhook>, ApiError> {
        let url = self.endpoint(project, &["webhooks"])?;
        self.get_json(url).await
    }

    async fn create_webhook(
        &self,
        project: &ProjectId,
        payload: &NewWebhook,
    ) -> Result<WebhookCreated, ApiError> {
        let url = self.endpoint(project, &["webhooks"])?;
        self.send_json(Method::POST, url, payload).await
    }

    async fn delete_webhook(&self, project: &ProjectId, id: &WebhookId) -> Result<(), ApiError> {
        let url = self.endpoint(project, &["webhooks", id.as_str()])?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn list_webhook_deliveries(
        &self,
        project: &ProjectId,
        id: &WebhookId,
    ) -> Result<Vec<WebhookDelivery>, ApiError> {
        let url = self.endpoint(project, &["webhooks", id.as_str(), "deliveries"])?;
        self.get_json(url).await
    }

    async fn list_validation_rules(
        &self,
        project: &ProjectId,
        collection: &str,
        field: &str,
    ) -> Result<Vec<ValidationRule>, ApiError> {
        let url = self.endpoint(
            project,
            &["validations", "collections", collection, "fields", field, "rules"],
        )?;
        self.get_json(url).await
    }

    async fn create_validation_rule(
        &self,
        project: &ProjectId,
        collection: &str,
        field: &str,
        payload: &NewValidationRule,
    ) -> Result<ValidationRule, ApiError> {
        let url = self.endpoint(
            project,
            &["validations", "collections", collection, "fields", field, "rules"],
        )?;
        self.send_json(Method::POST, url, payload).await
    }

    async fn update_validation_rule(
        &self,
        project: &ProjectId,
        id: &RuleId,
        patch: &RulePatch,
    ) -> Result<ValidationRule, ApiError> {
        let url = self.endpoint(project, &["validations", "rules", id.as_str()])?;
        self.send_json(Method::PATCH, url, patch).await
    }

    async fn delete_validation_rule(
        &self,
        project: &ProjectId,
        id: &RuleId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(project, &["validations", "rules", id.as_str()])?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn validate_record(
        &self,
        project: &ProjectId,
        collection: &str,
        values: &Map<String, Value>,
    ) -> Result<RecordValidation, ApiError> {
        let url = self.endpoint(project, &["validations", "collections", collection, "validate"])?;
        self.send_json(Method::POST, url, &json!({ "data": values })).await
    }

    async fn rule_types(&self, project: &ProjectId) -> Result<Vec<RuleTypeInfo>, ApiError> {
        let url = self.endpoint(project, &["validations", "rule-types"])?;
        let catalog: RuleTypeCatalog = self.get_json(url).await?;
        Ok(catalog.rule_types)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the per-request header map. Credentials are marked sensitive.
fn default_headers(
    bearer_token: Option<&str>,
    api_key: Option<&str>,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = bearer_token {
        let mut header = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::Config("invalid bearer token header".to_string()))?;
        header.set_sensitive(true);
        headers.insert(AUTHORIZATION, header);
    }
    if let Some(key) = api_key {
        let mut header = HeaderValue::from_str(key)
            .map_err(|_| ApiError::Config("invalid api key header".to_string()))?;
        header.set_sensitive(true);
        headers.insert(API_KEY_HEADER, header);
    }
    Ok(headers)
}

/// Decodes a JSON response body.
fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Reads a response body while enforcing a hard byte limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();
    let mut total: usize = 0;
    while let Some(chunk) =
        response.chunk().await.map_err(|err| ApiError::Transport(err.to_string()))?
    {
        let next_total = total.checked_add(chunk.len()).ok_or(ApiError::ResponseTooLarge {
            actual: usize::MAX,
            limit,
        })?;
        if next_total > limit {
            return Err(ApiError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
        total = next_total;
    }
    Ok(body)
}
