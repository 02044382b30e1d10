//! Embedding support for the semantic cache.
//!
//! This module provides:
//! - The [`Vectorizer`] contract and its failure-as-value wrapper [`EmbeddingOutcome`]
//! - An OpenAI-compatible HTTP vectorizer ([`EmbeddingClient`])
//! - Vector operations used for similarity matching

mod client;
mod types;
mod vectorizer;
mod vectors;

pub use client::{EmbeddingClient, EmbeddingClientBuilder, DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL};
pub use types::{EmbeddingRequest, EmbeddingResponse, EmbeddingUsage};
pub use vectorizer::{EmbeddingOutcome, UnavailableVectorizer, Vectorizer};
pub use vectors::{cosine_similarity, dot_product, magnitude, zero_vector, Vector};
