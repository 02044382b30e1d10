//! Embedding client for generating embeddings.

use super::types::{EmbeddingRequest, EmbeddingResponse};
use super::vectorizer::Vectorizer;
use super::vectors::Vector;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// HTTP vectorizer for OpenAI-compatible `/v1/embeddings` endpoints.
pub struct EmbeddingClient {
    http_client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
    dimensions: Option<usize>,
}

impl EmbeddingClient {
    pub fn builder() -> EmbeddingClientBuilder {
        EmbeddingClientBuilder::new()
    }

    pub async fn embed_text(&self, text: &str) -> Result<EmbeddingResponse> {
        let mut request = EmbeddingRequest::single(&self.model, text);
        if let Some(dims) = self.dimensions {
            request = request.with_dimensions(dims);
        }
        let endpoint = format!("{}/v1/embeddings", self.base_url);
        let response = self
            .http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::vectorization_with_context(
                    format!("Embedding request failed: {}", e),
                    ErrorContext::new().with_source("embeddings"),
                )
            })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::vectorization_with_context(
                format!("Failed to read response: {}", e),
                ErrorContext::new().with_source("embeddings"),
            )
        })?;
        if !status.is_success() {
            return Err(Error::vectorization_with_context(
                format!("Embedding API error ({})", status),
                ErrorContext::new()
                    .with_details(body)
                    .with_source("embeddings"),
            ));
        }
        let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            Error::vectorization_with_context(
                format!("Embedding response is not JSON: {}", e),
                ErrorContext::new().with_source("embeddings"),
            )
        })?;
        EmbeddingResponse::from_openai_format(&json)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Vectorizer for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vector> {
        Ok(self.embed_text(text).await?.vector)
    }
    fn name(&self) -> &'static str {
        "openai-embeddings"
    }
}

pub struct EmbeddingClientBuilder {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    dimensions: Option<usize>,
    timeout_secs: u64,
}

impl EmbeddingClientBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            dimensions: None,
            timeout_secs: 30,
        }
    }
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<EmbeddingClient> {
        let model = self
            .model
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "API key required",
                    ErrorContext::new()
                        .with_field_path("OPENAI_API_KEY")
                        .with_source("embeddings"),
                )
            })?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(base_url.clone())
                    .with_source("embeddings"),
            )
        })?;
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(EmbeddingClient {
            http_client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            dimensions: self.dimensions,
        })
    }
}

impl Default for EmbeddingClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
