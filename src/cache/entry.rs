use crate::embeddings::Vector;
use std::time::{Duration, Instant};

/// A cached query/answer pair.
///
/// Everything except `last_used_at` is fixed at creation.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    query: String,
    answer: String,
    embedding: Vector,
    created_at: Instant,
    last_used_at: Instant,
}

impl CacheEntry {
    pub fn new(query: impl Into<String>, answer: impl Into<String>, embedding: Vector) -> Self {
        Self::new_at(query, answer, embedding, Instant::now())
    }

    pub(crate) fn new_at(
        query: impl Into<String>,
        answer: impl Into<String>,
        embedding: Vector,
        now: Instant,
    ) -> Self {
        Self {
            query: query.into(),
            answer: answer.into(),
            embedding,
            created_at: now,
            last_used_at: now,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn created(&self) -> Instant {
        self.created_at
    }

    pub fn last_used(&self) -> Instant {
        self.last_used_at
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_used_at = now;
    }
}
