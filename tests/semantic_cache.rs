//! End-to-end behavior of the semantic cache engine.

use ai_lib_semcache::cache::normalize;
use ai_lib_semcache::{
    CacheConfig, Error, Generator, MatchSource, Result, SemanticCache, TemplateGenerator,
    UnavailableVectorizer, Vector, Vectorizer,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Vectorizer backed by a fixed table of normalized text → vector.
struct TableVectorizer {
    table: HashMap<String, Vector>,
    calls: AtomicUsize,
}

impl TableVectorizer {
    fn new(pairs: &[(&str, &[f32])]) -> Self {
        Self {
            table: pairs
                .iter()
                .map(|(k, v)| (normalize(k), v.to_vec()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Vectorizer for TableVectorizer {
    async fn embed(&self, text: &str) -> Result<Vector> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table
            .get(&normalize(text))
            .cloned()
            .ok_or_else(|| Error::vectorization(format!("no fixture for {:?}", text)))
    }
    fn name(&self) -> &'static str {
        "table"
    }
}

struct FailingGenerator {
    generation_error: bool,
}

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _: &str) -> Result<String> {
        if self.generation_error {
            Err(Error::generation("model overloaded"))
        } else {
            Err(Error::validation("prompt rejected"))
        }
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

fn long_ttl(capacity: usize) -> CacheConfig {
    CacheConfig::new()
        .with_max_entries(capacity)
        .with_ttl(Duration::from_secs(24 * 3600))
}

fn build(config: CacheConfig, vectorizer: Arc<dyn Vectorizer>) -> SemanticCache {
    SemanticCache::builder()
        .config(config)
        .vectorizer(vectorizer)
        .generator(Arc::new(TemplateGenerator::new()))
        .build()
        .unwrap()
}

fn exact_only(config: CacheConfig) -> SemanticCache {
    build(config, Arc::new(UnavailableVectorizer))
}

fn answer_of(cache: &SemanticCache, query: &str) -> Option<String> {
    cache
        .lookup_exact(query)
        .unwrap()
        .map(|e| e.answer().to_string())
}

#[tokio::test]
async fn test_exact_round_trip_with_variants() {
    let cache = exact_only(long_ttl(8));
    cache.add("Explain Borrowing", "A").await.unwrap();
    assert_eq!(answer_of(&cache, "Explain Borrowing").as_deref(), Some("A"));
    assert_eq!(answer_of(&cache, "  explain borrowing\n").as_deref(), Some("A"));
    assert_eq!(answer_of(&cache, "EXPLAIN BORROWING").as_deref(), Some("A"));
    assert_eq!(answer_of(&cache, "explain  borrowing"), None);
}

#[tokio::test]
async fn test_ttl_expiry_exact_removes_entry() {
    let cache = exact_only(CacheConfig::new().with_ttl(Duration::ZERO));
    cache.add("q", "a").await.unwrap();
    assert_eq!(cache.len().unwrap(), 1);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(cache.lookup_exact("q").unwrap().is_none());
    assert_eq!(cache.len().unwrap(), 0);
}

#[tokio::test]
async fn test_ttl_expiry_semantic_removes_entry() {
    let vectorizer = Arc::new(TableVectorizer::new(&[
        ("sort a vec", &[1.0, 0.0]),
        ("sort a vector", &[0.99, 0.1]),
    ]));
    let cache = build(
        CacheConfig::new()
            .with_ttl(Duration::ZERO)
            .with_similarity_threshold(0.5),
        vectorizer,
    );
    cache.add("sort a vec", "use sort()").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(cache.lookup_semantic("sort a vector").await.unwrap().is_none());
    assert!(cache.is_empty().unwrap());
}

#[tokio::test]
async fn test_capacity_eviction_drops_least_recent() {
    let cache = exact_only(long_ttl(3));
    for q in ["q1", "q2", "q3", "q4"] {
        cache.add(q, &format!("a-{}", q)).await.unwrap();
    }
    assert_eq!(cache.len().unwrap(), 3);
    assert_eq!(answer_of(&cache, "q1"), None);
    for q in ["q2", "q3", "q4"] {
        assert_eq!(answer_of(&cache, q), Some(format!("a-{}", q)));
    }
}

#[tokio::test]
async fn test_recency_protects_touched_entry() {
    let cache = exact_only(long_ttl(3));
    for q in ["old", "b", "c"] {
        cache.add(q, q).await.unwrap();
    }
    assert!(cache.lookup_exact("old").unwrap().is_some());
    cache.add("d", "d").await.unwrap();
    cache.add("e", "e").await.unwrap();
    assert_eq!(answer_of(&cache, "old").as_deref(), Some("old"));
    assert_eq!(answer_of(&cache, "b"), None);
    assert_eq!(answer_of(&cache, "c"), None);
}

#[tokio::test]
async fn test_scenario_capacity_two() {
    let cache = exact_only(long_ttl(2));
    cache.add("Q1", "A1").await.unwrap();
    cache.add("Q2", "A2").await.unwrap();
    cache.add("Q3", "A3").await.unwrap();
    assert_eq!(answer_of(&cache, "Q1"), None);
    assert_eq!(answer_of(&cache, "Q2").as_deref(), Some("A2"));
    assert_eq!(answer_of(&cache, "Q3").as_deref(), Some("A3"));
}

#[tokio::test]
async fn test_similarity_threshold_boundary() {
    let fixtures: &[(&str, &[f32])] = &[("stored", &[1.0, 0.0]), ("probe", &[3.0, 0.0])];

    // cosine(stored, probe) is exactly 1.0
    let at_threshold = build(
        long_ttl(4).with_similarity_threshold(1.0),
        Arc::new(TableVectorizer::new(fixtures)),
    );
    at_threshold.add("stored", "a").await.unwrap();
    assert!(at_threshold.lookup_semantic("probe").await.unwrap().is_none());

    let below_threshold = build(
        long_ttl(4).with_similarity_threshold(0.999),
        Arc::new(TableVectorizer::new(fixtures)),
    );
    below_threshold.add("stored", "a").await.unwrap();
    let hit = below_threshold.lookup_semantic("probe").await.unwrap().unwrap();
    assert_eq!(hit.answer(), "a");
}

#[tokio::test]
async fn test_process_query_semantic_hit() {
    let vectorizer = Arc::new(TableVectorizer::new(&[
        ("How do I sort a Vec?", &[0.9, 0.1, 0.0]),
        ("how to sort a vector", &[0.88, 0.12, 0.01]),
        ("what is a lifetime", &[0.0, 0.1, 0.95]),
    ]));
    let cache = build(
        long_ttl(8).with_similarity_threshold(0.95),
        vectorizer.clone(),
    );

    let miss = cache.process_query("How do I sort a Vec?").await.unwrap();
    assert_eq!(miss.source, MatchSource::Miss);
    // one embedding per miss: the semantic scan and the insert share it
    assert_eq!(vectorizer.calls(), 1);

    let hit = cache.process_query("how to sort a vector").await.unwrap();
    assert_eq!(hit.source, MatchSource::Semantic);
    assert!(hit.cached);
    assert_eq!(hit.answer, "Review result for: How do I sort a Vec?");

    let other = cache.process_query("what is a lifetime").await.unwrap();
    assert_eq!(other.source, MatchSource::Miss);
    assert_eq!(cache.len().unwrap(), 2);

    let exact = cache.process_query("HOW DO I SORT A VEC?").await.unwrap();
    assert_eq!(exact.source, MatchSource::Exact);
}

#[tokio::test]
async fn test_hit_rate_accounting() {
    let cache = exact_only(long_ttl(8));
    cache.process_query("a").await.unwrap();
    cache.process_query("b").await.unwrap();
    cache.process_query("A").await.unwrap();
    let stats = cache.stats().unwrap();
    assert_eq!(stats.total_requests, 3);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 2);
    assert_eq!(stats.hit_rate, 0.33);
    assert_eq!(stats.savings_percent, 33.33);
    assert_eq!(stats.cache_size, 2);
}

#[tokio::test]
async fn test_cost_savings_from_config() {
    let config = long_ttl(8)
        .with_cost_per_million_tokens(10.0)
        .with_avg_tokens_per_request(1000);
    let cache = exact_only(config);
    cache.process_query("q").await.unwrap();
    for _ in 0..3 {
        cache.process_query("q").await.unwrap();
    }
    // 3 hits * 1000 tokens * 10.0 / 1e6
    assert_eq!(cache.stats().unwrap().cost_savings, 0.03);
}

#[tokio::test]
async fn test_failing_vectorizer_never_fails_requests() {
    let cache = exact_only(long_ttl(8).with_similarity_threshold(-1.0));
    cache.add("stored", "a").await.unwrap();
    // threshold -1.0 would accept anything with a defined similarity
    assert!(cache.lookup_semantic("stored").await.unwrap().is_none());
    assert!(cache.lookup_semantic("anything").await.unwrap().is_none());

    let first = cache.process_query("new question").await.unwrap();
    assert_eq!(first.source, MatchSource::Miss);
    let again = cache.process_query("new question").await.unwrap();
    assert_eq!(again.source, MatchSource::Exact);
}

#[tokio::test]
async fn test_fallback_embedding_never_matches() {
    // "broken" has no fixture, so it is cached with the zero fallback vector
    let vectorizer = Arc::new(TableVectorizer::new(&[("probe", &[1.0; 10])]));
    let cache = build(long_ttl(8).with_similarity_threshold(-1.0), vectorizer);
    cache.add("broken", "a").await.unwrap();
    assert!(cache.lookup_semantic("probe").await.unwrap().is_none());
    assert_eq!(answer_of(&cache, "broken").as_deref(), Some("a"));
}

#[tokio::test]
async fn test_generation_failure_is_surfaced_and_not_cached() {
    let cache = SemanticCache::builder()
        .config(long_ttl(8))
        .vectorizer(Arc::new(UnavailableVectorizer))
        .generator(Arc::new(FailingGenerator {
            generation_error: true,
        }))
        .build()
        .unwrap();
    let err = cache.process_query("q").await.unwrap_err();
    assert!(err.is_generation());
    assert!(cache.is_empty().unwrap());
    let stats = cache.stats().unwrap();
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.cache_hits, 0);
}

#[tokio::test]
async fn test_other_generator_errors_become_generation_errors() {
    let cache = SemanticCache::builder()
        .vectorizer(Arc::new(UnavailableVectorizer))
        .generator(Arc::new(FailingGenerator {
            generation_error: false,
        }))
        .build()
        .unwrap();
    let err = cache.process_query("q").await.unwrap_err();
    assert!(err.is_generation());
    assert!(err.to_string().contains("prompt rejected"));
    assert_eq!(
        err.context().and_then(|c| c.source.as_deref()),
        Some("failing")
    );
}

#[tokio::test]
async fn test_instances_are_independent() {
    let a = exact_only(long_ttl(4));
    let b = exact_only(long_ttl(4));
    a.process_query("shared").await.unwrap();
    let resp = b.process_query("shared").await.unwrap();
    assert_eq!(resp.source, MatchSource::Miss);
    assert_eq!(a.stats().unwrap().total_requests, 1);
    assert_eq!(b.stats().unwrap().total_requests, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_keep_invariants() {
    let cache = Arc::new(exact_only(long_ttl(4)));
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..64 {
        let cache = Arc::clone(&cache);
        tasks.spawn(async move {
            let query = format!("question {}", i % 8);
            cache.process_query(&query).await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        let resp = joined.unwrap().unwrap();
        assert!(resp.answer.starts_with("Review result for: question "));
    }
    let stats = cache.stats().unwrap();
    assert_eq!(stats.total_requests, 64);
    assert_eq!(stats.cache_hits + stats.cache_misses, 64);
    assert!(stats.cache_misses >= 8);
    assert!(cache.len().unwrap() <= 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_hits_are_counted_with_their_match() {
    let cache = Arc::new(exact_only(long_ttl(4)));
    cache.process_query("warm").await.unwrap();

    let reader = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            let mut last_hits = 0;
            for _ in 0..200 {
                let stats = cache.stats().unwrap();
                assert!(stats.cache_hits >= last_hits);
                assert_eq!(stats.cache_hits + stats.cache_misses, stats.total_requests);
                last_hits = stats.cache_hits;
                tokio::task::yield_now().await;
            }
        })
    };

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..32 {
        let cache = Arc::clone(&cache);
        tasks.spawn(async move { cache.process_query("WARM").await });
    }
    let mut exact = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap().unwrap().source == MatchSource::Exact {
            exact += 1;
        }
    }
    reader.await.unwrap();

    let stats = cache.stats().unwrap();
    assert_eq!(exact, 32);
    assert_eq!(stats.cache_hits, 32);
    assert_eq!(stats.cache_misses, 1);
}
