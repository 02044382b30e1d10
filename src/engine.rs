//! Cache orchestrator: exact → semantic → generate.

use crate::analytics::{Analytics, CacheStats, SavingsModel};
use crate::cache::{match_exact, match_semantic, CacheEntry, CacheKey, EntryStore};
use crate::config::CacheConfig;
use crate::embeddings::{EmbeddingOutcome, Vectorizer};
use crate::generation::Generator;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which stage produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Exact,
    Semantic,
    Miss,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchSource::Exact => "exact",
            MatchSource::Semantic => "semantic",
            MatchSource::Miss => "miss",
        }
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub answer: String,
    pub cached: bool,
    pub source: MatchSource,
    pub latency_ms: u64,
}

/// Everything guarded by the single state lock.
struct CacheState {
    store: EntryStore,
    analytics: Analytics,
}

/// Semantic response cache.
///
/// Store contents, recency order and analytics counters sit behind one mutex.
/// The lock is never held across an `.await`: embeddings and generated answers
/// are obtained first, then the state is locked to read or mutate.
pub struct SemanticCache {
    config: CacheConfig,
    savings: SavingsModel,
    vectorizer: Arc<dyn Vectorizer>,
    generator: Arc<dyn Generator>,
    state: Mutex<CacheState>,
}

impl SemanticCache {
    pub fn builder() -> SemanticCacheBuilder {
        SemanticCacheBuilder::new()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn savings_model(&self) -> &SavingsModel {
        &self.savings
    }

    /// Serve a query from the cache, or generate and cache a fresh answer.
    ///
    /// Vectorizer failures never fail this call. A generator failure is
    /// returned as [`Error::Generation`] after the miss has been counted, and
    /// nothing is cached for it.
    pub async fn process_query(&self, query: &str) -> Result<QueryResponse> {
        let started = Instant::now();
        let respond = |answer: String, source: MatchSource| QueryResponse {
            answer,
            cached: source != MatchSource::Miss,
            source,
            latency_ms: started.elapsed().as_millis() as u64,
        };

        if let Some(entry) = self.find_exact(query, true)? {
            return Ok(respond(entry.answer().to_string(), MatchSource::Exact));
        }

        // Embed once; the same outcome serves the semantic scan and the insert.
        let outcome = self.embed(query).await;
        if let Some(entry) = self.match_embedding(&outcome, true)? {
            return Ok(respond(entry.answer().to_string(), MatchSource::Semantic));
        }

        self.state()?.analytics.record_miss();
        debug!(source = %MatchSource::Miss, "cache miss, generating");
        let answer = self.generator.generate(query).await.map_err(|e| match e {
            Error::Generation { .. } => e,
            other => Error::generation_with_context(
                other.to_string(),
                ErrorContext::new().with_source(self.generator.name()),
            ),
        })?;
        self.insert(query, &answer, outcome)?;
        Ok(respond(answer, MatchSource::Miss))
    }

    /// Look up by normalized key, expiring the entry if it is past its TTL.
    pub fn lookup_exact(&self, query: &str) -> Result<Option<CacheEntry>> {
        self.find_exact(query, false)
    }

    /// Look up by embedding similarity.
    ///
    /// Returns `Ok(None)` when the vectorizer fails.
    pub async fn lookup_semantic(&self, query: &str) -> Result<Option<CacheEntry>> {
        let outcome = self.embed(query).await;
        self.match_embedding(&outcome, false)
    }

    /// Insert a query/answer pair without touching hit/miss accounting.
    ///
    /// If the vectorizer fails the entry is stored with a zero vector, which
    /// keeps it reachable by exact lookup but never by semantic lookup.
    pub async fn add(&self, query: &str, answer: &str) -> Result<()> {
        let outcome = self.embed(query).await;
        self.insert(query, answer, outcome)
    }

    async fn embed(&self, text: &str) -> EmbeddingOutcome {
        let outcome = EmbeddingOutcome::request(self.vectorizer.as_ref(), text).await;
        if let EmbeddingOutcome::Unavailable(ref reason) = outcome {
            warn!(
                vectorizer = self.vectorizer.name(),
                %reason,
                "embedding unavailable"
            );
        }
        outcome
    }

    /// With `count_hit`, a hit is recorded under the same lock that promoted it.
    fn find_exact(&self, query: &str, count_hit: bool) -> Result<Option<CacheEntry>> {
        let key = CacheKey::for_query(query);
        let mut guard = self.state()?;
        let state = &mut *guard;
        let hit = match_exact(&mut state.store, &key, Instant::now());
        if hit.is_some() {
            if count_hit {
                state.analytics.record_hit();
            }
            debug!(key = %key, source = %MatchSource::Exact, "cache hit");
        }
        Ok(hit)
    }

    fn match_embedding(
        &self,
        outcome: &EmbeddingOutcome,
        count_hit: bool,
    ) -> Result<Option<CacheEntry>> {
        let Some(embedding) = outcome.vector() else {
            return Ok(None);
        };
        let threshold = self.config.similarity_threshold;
        let mut guard = self.state()?;
        let state = &mut *guard;
        let hit = match_semantic(&mut state.store, embedding, threshold, Instant::now());
        if hit.is_some() && count_hit {
            state.analytics.record_hit();
        }
        drop(guard);
        Ok(hit.map(|m| {
            debug!(
                key = %CacheKey::for_query(m.entry.query()),
                similarity = m.similarity,
                source = %MatchSource::Semantic,
                "cache hit"
            );
            m.entry
        }))
    }

    fn insert(&self, query: &str, answer: &str, outcome: EmbeddingOutcome) -> Result<()> {
        let embedding = outcome.into_vector_or_zero(self.config.fallback_dimensions);
        let key = CacheKey::for_query(query);
        let entry = CacheEntry::new_at(query, answer, embedding, Instant::now());
        self.state()?.store.insert(key.clone(), entry);
        debug!(key = %key, "cached new entry");
        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let state = self.state()?;
        Ok(state.analytics.get_stats(state.store.len(), &self.savings))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.state()?.store.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn state(&self) -> Result<MutexGuard<'_, CacheState>> {
        self.state.lock().map_err(|_| {
            Error::runtime_with_context(
                "cache state poisoned",
                ErrorContext::new().with_source("semantic_cache"),
            )
        })
    }
}

pub struct SemanticCacheBuilder {
    config: CacheConfig,
    savings: Option<SavingsModel>,
    vectorizer: Option<Arc<dyn Vectorizer>>,
    generator: Option<Arc<dyn Generator>>,
}

impl SemanticCacheBuilder {
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            savings: None,
            vectorizer: None,
            generator: None,
        }
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the model price derived from the configuration.
    ///
    /// The average request size always comes from the configuration, so
    /// presets such as [`SavingsModel::gpt_4o`] can be passed as-is.
    pub fn savings_model(mut self, savings: SavingsModel) -> Self {
        self.savings = Some(savings);
        self
    }

    pub fn vectorizer(mut self, vectorizer: Arc<dyn Vectorizer>) -> Self {
        self.vectorizer = Some(vectorizer);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn build(self) -> Result<SemanticCache> {
        self.config.validate()?;
        let vectorizer = self
            .vectorizer
            .ok_or_else(|| Error::configuration("Vectorizer must be specified"))?;
        let generator = self
            .generator
            .ok_or_else(|| Error::configuration("Generator must be specified"))?;
        let savings = match self.savings {
            Some(model) => model.with_avg_tokens_per_request(self.config.avg_tokens_per_request),
            None => SavingsModel::new(
                "configured",
                self.config.cost_per_million_tokens,
                self.config.avg_tokens_per_request,
            ),
        };
        info!(
            max_entries = self.config.max_entries,
            ttl_secs = self.config.ttl_secs,
            similarity_threshold = self.config.similarity_threshold,
            vectorizer = vectorizer.name(),
            generator = generator.name(),
            "semantic cache ready"
        );
        Ok(SemanticCache {
            state: Mutex::new(CacheState {
                store: EntryStore::new(self.config.max_entries, self.config.ttl())?,
                analytics: Analytics::new(),
            }),
            config: self.config,
            savings,
            vectorizer,
            generator,
        })
    }
}

impl Default for SemanticCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::UnavailableVectorizer;
    use crate::generation::TemplateGenerator;

    fn cache(config: CacheConfig) -> SemanticCache {
        SemanticCache::builder()
            .config(config)
            .vectorizer(Arc::new(UnavailableVectorizer))
            .generator(Arc::new(TemplateGenerator::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let err = SemanticCache::builder()
            .generator(Arc::new(TemplateGenerator::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_builder_validates_config() {
        let err = SemanticCache::builder()
            .config(CacheConfig::new().with_max_entries(0))
            .vectorizer(Arc::new(UnavailableVectorizer))
            .generator(Arc::new(TemplateGenerator::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_savings_model_from_config() {
        let c = cache(
            CacheConfig::new()
                .with_cost_per_million_tokens(4.0)
                .with_avg_tokens_per_request(250),
        );
        assert_eq!(c.savings_model().cost_per_million_tokens, 4.0);
        assert_eq!(c.savings_model().avg_tokens_per_request, 250);
    }

    #[tokio::test]
    async fn test_preset_pricing_uses_configured_request_size() {
        let c = SemanticCache::builder()
            .config(CacheConfig::new().with_avg_tokens_per_request(1000))
            .savings_model(SavingsModel::gpt_4o())
            .vectorizer(Arc::new(UnavailableVectorizer))
            .generator(Arc::new(TemplateGenerator::new()))
            .build()
            .unwrap();
        assert_eq!(c.savings_model().avg_tokens_per_request, 1000);
        assert_eq!(c.savings_model().cost_per_million_tokens, 5.0);

        c.process_query("q").await.unwrap();
        for _ in 0..10 {
            c.process_query("q").await.unwrap();
        }
        let stats = c.stats().unwrap();
        assert_eq!(stats.cache_hits, 10);
        // 10 * 1000 * 5.0 / 1e6
        assert_eq!(stats.cost_savings, 0.05);
    }

    #[tokio::test]
    async fn test_lookups_do_not_count_but_queries_do() {
        let c = cache(CacheConfig::default());
        c.add("q", "a").await.unwrap();
        assert!(c.lookup_exact("q").unwrap().is_some());
        assert!(c.lookup_semantic("q").await.unwrap().is_none());
        assert_eq!(c.stats().unwrap().total_requests, 0);

        let resp = c.process_query("q").await.unwrap();
        assert_eq!(resp.source, MatchSource::Exact);
        let stats = c.stats().unwrap();
        assert_eq!((stats.cache_hits, stats.cache_misses), (1, 0));
    }

    #[tokio::test]
    async fn test_miss_then_exact_hit() {
        let c = cache(CacheConfig::default());
        let first = c.process_query("What is LRU?").await.unwrap();
        assert_eq!(first.source, MatchSource::Miss);
        assert!(!first.cached);
        assert_eq!(first.answer, "Review result for: What is LRU?");

        let second = c.process_query("  what is lru?").await.unwrap();
        assert_eq!(second.source, MatchSource::Exact);
        assert!(second.cached);
        assert_eq!(second.answer, first.answer);

        let stats = c.stats().unwrap();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[tokio::test]
    async fn test_add_bypasses_accounting() {
        let c = cache(CacheConfig::default());
        c.add("q", "a").await.unwrap();
        assert_eq!(c.len().unwrap(), 1);
        assert_eq!(c.lookup_exact("Q").unwrap().unwrap().answer(), "a");
        assert_eq!(c.stats().unwrap().total_requests, 0);
    }

    #[tokio::test]
    async fn test_fallback_vector_has_configured_length() {
        let c = cache(CacheConfig::new().with_fallback_dimensions(4));
        c.add("q", "a").await.unwrap();
        let entry = c.lookup_exact("q").unwrap().unwrap();
        assert_eq!(entry.embedding(), vec![0.0f32; 4].as_slice());
    }

    #[test]
    fn test_response_serialization() {
        let resp = QueryResponse {
            answer: "a".into(),
            cached: true,
            source: MatchSource::Semantic,
            latency_ms: 3,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["source"], "semantic");
        assert_eq!(json["latencyMs"], 3);
        assert_eq!(MatchSource::Miss.to_string(), "miss");
    }
}
