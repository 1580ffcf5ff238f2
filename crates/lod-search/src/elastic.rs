//! Elasticsearch backend over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use lod_types::{LodError, Result, Settings};

use crate::backend::SearchBackend;
use crate::response::{GetDocument, MultiGetResponse, MultiSearchResponse, SearchResponse};

/// Configuration for the Elasticsearch client.
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    /// Base URL (e.g., "http://localhost:9200")
    pub base_url: String,

    /// Optional API key, sent as `Authorization: ApiKey <key>`
    pub api_key: Option<SecretString>,

    /// Request timeout
    pub timeout: Duration,
}

impl ElasticConfig {
    /// Create config for an unauthenticated cluster.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Build the client config from application settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings.backend_url.clone(),
            api_key: settings
                .api_key
                .as_ref()
                .map(|key| SecretString::from(key.clone())),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Search backend talking to an Elasticsearch cluster.
pub struct ElasticBackend {
    client: Client,
    config: ElasticConfig,
}

impl ElasticBackend {
    /// Create a new client.
    pub fn new(config: ElasticConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LodError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, index: &str, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            index,
            endpoint
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("ApiKey {}", key.expose_secret())),
            None => request,
        }
    }

    /// Send a request and decode the JSON body, mapping failures to backend errors.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| LodError::Backend(e.to_string()))?;

        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| LodError::Backend(format!("invalid response body: {e}")))
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(LodError::Backend(format!("HTTP {}: {}", status, body)))
}

/// Encode queries as a `_msearch` NDJSON body: an empty header line per query.
fn ndjson_body(queries: &[Value]) -> Result<String> {
    let mut body = String::new();
    for query in queries {
        body.push_str("{}\n");
        body.push_str(&serde_json::to_string(query)?);
        body.push('\n');
    }
    Ok(body)
}

/// Decode one `_msearch` item; per-item failures carry an `error` object.
fn decode_msearch_item(position: usize, item: Value) -> Result<SearchResponse> {
    if let Some(error) = item.get("error") {
        let reason = error
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(LodError::Backend(format!(
            "query {} of batch failed: {}",
            position, reason
        )));
    }
    Ok(serde_json::from_value(item)?)
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    async fn search(&self, index: &str, query: &Value) -> Result<SearchResponse> {
        debug!(index, "search");
        let request = self.client.post(self.url(index, "_search")).json(query);
        self.send(request).await
    }

    async fn multi_search(&self, index: &str, queries: &[Value]) -> Result<Vec<SearchResponse>> {
        debug!(index, queries = queries.len(), "multi-search");
        let request = self
            .client
            .post(self.url(index, "_msearch"))
            .header("Content-Type", "application/x-ndjson")
            .body(ndjson_body(queries)?);

        let envelope: MultiSearchResponse = self.send(request).await?;
        envelope
            .responses
            .into_iter()
            .enumerate()
            .map(|(position, item)| decode_msearch_item(position, item))
            .collect()
    }

    async fn multi_get(&self, index: &str, ids: &[String]) -> Result<Vec<GetDocument>> {
        debug!(index, ids = ids.len(), "multi-get");
        let request = self
            .client
            .post(self.url(index, "_mget"))
            .json(&json!({ "ids": ids }));

        let envelope: MultiGetResponse = self.send(request).await?;
        Ok(envelope.docs)
    }
}
