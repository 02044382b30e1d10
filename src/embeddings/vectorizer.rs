//! Vectorizer contract.

use super::vectors::{zero_vector, Vector};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;

/// Turns text into a fixed-dimension embedding.
///
/// Implementations are expected to be network-bound; callers never hold cache
/// state locks while awaiting them.
#[async_trait]
pub trait Vectorizer: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vector>;
    fn name(&self) -> &'static str;
}

/// Result of asking a vectorizer for an embedding, with failure as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutcome {
    Ready(Vector),
    Unavailable(String),
}

impl EmbeddingOutcome {
    pub async fn request(vectorizer: &dyn Vectorizer, text: &str) -> Self {
        match vectorizer.embed(text).await {
            Ok(vector) => Self::Ready(vector),
            Err(e) => Self::Unavailable(e.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn vector(&self) -> Option<&[f32]> {
        match self {
            Self::Ready(v) => Some(v.as_slice()),
            Self::Unavailable(_) => None,
        }
    }

    /// The embedding, or a zero vector of `dimensions` that can never match.
    pub fn into_vector_or_zero(self, dimensions: usize) -> Vector {
        match self {
            Self::Ready(v) => v,
            Self::Unavailable(_) => zero_vector(dimensions),
        }
    }
}

/// A vectorizer that always fails; only exact matching works with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableVectorizer;

impl UnavailableVectorizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Vectorizer for UnavailableVectorizer {
    async fn embed(&self, _: &str) -> Result<Vector> {
        Err(Error::vectorization_with_context(
            "no vectorizer configured",
            ErrorContext::new().with_source("embeddings"),
        ))
    }
    fn name(&self) -> &'static str {
        "unavailable"
    }
}
