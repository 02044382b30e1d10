//! Embedding request and response types (OpenAI wire format).

use super::vectors::Vector;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub input: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

impl EmbeddingRequest {
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            input: text.into(),
            model: model.into(),
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub vector: Vector,
    pub model: String,
    pub usage: EmbeddingUsage,
}

impl EmbeddingResponse {
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }

    /// Parse `{"data": [{"embedding": [...]}], "model": ..., "usage": ...}`.
    ///
    /// Only the first embedding is used; an empty or non-numeric vector is rejected.
    pub fn from_openai_format(data: &serde_json::Value) -> Result<Self> {
        let raw = data["data"]
            .as_array()
            .and_then(|items| items.first())
            .and_then(|item| item["embedding"].as_array())
            .ok_or_else(|| malformed("missing data[0].embedding"))?;
        let vector = raw
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vector>>()
            .ok_or_else(|| malformed("non-numeric embedding component"))?;
        if vector.is_empty() {
            return Err(malformed("empty embedding"));
        }
        let model = data["model"].as_str().unwrap_or("unknown").to_string();
        let usage = EmbeddingUsage {
            prompt_tokens: data["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: data["usage"]["total_tokens"].as_u64().unwrap_or(0) as u32,
        };
        Ok(Self {
            vector,
            model,
            usage,
        })
    }
}

fn malformed(details: &str) -> Error {
    Error::vectorization_with_context(
        "Malformed embedding response",
        ErrorContext::new()
            .with_details(details)
            .with_source("embeddings"),
    )
}
