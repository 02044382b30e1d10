//! # ai-lib-semcache
//!
//! 面向 AI-Protocol 运行时的语义响应缓存：精确匹配、向量相似度匹配、LRU 淘汰与 TTL 过期。
//!
//! Semantic response cache for expensive generation calls. Repeated or
//! semantically similar queries are answered from a bounded, time-limited
//! cache instead of re-invoking the model.
//!
//! ## Overview
//!
//! A query goes through three stages, each short-circuiting:
//!
//! 1. **Exact match**: the query is normalized (trimmed, lowercased) and hashed;
//!    a live entry under that key is returned.
//! 2. **Semantic match**: the query is embedded by a [`Vectorizer`] and compared
//!    to cached embeddings by cosine similarity; the first entry strictly above
//!    the threshold is returned.
//! 3. **Miss**: a [`Generator`] produces a fresh answer, which is cached.
//!
//! Every outcome is counted, and [`SemanticCache::stats`] reports hit rate and
//! estimated cost savings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_lib_semcache::{CacheConfig, EmbeddingClient, SemanticCache, TemplateGenerator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> ai_lib_semcache::Result<()> {
//!     let cache = SemanticCache::builder()
//!         .config(CacheConfig::from_env()?)
//!         .vectorizer(Arc::new(EmbeddingClient::builder().build()?))
//!         .generator(Arc::new(TemplateGenerator::new()))
//!         .build()?;
//!
//!     let resp = cache.process_query("Review this function for bugs").await?;
//!     println!("{} (cached: {}, via {})", resp.answer, resp.cached, resp.source);
//!     println!("{}", serde_json::to_string(&cache.stats()?)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Keys, entries, the recency-ordered store and the matchers |
//! | [`engine`] | The [`SemanticCache`] orchestrator |
//! | [`embeddings`] | Vectorizer contract, HTTP client and vector math |
//! | [`generation`] | Generator contract and a template stand-in |
//! | [`analytics`] | Hit/miss counters and savings estimation |
//! | [`config`] | Tunables from defaults, YAML or environment |

pub mod analytics;
pub mod cache;
pub mod config;
pub mod embeddings;
pub mod engine;
pub mod generation;

pub use analytics::{CacheStats, SavingsModel};
pub use config::CacheConfig;
pub use embeddings::{EmbeddingClient, EmbeddingOutcome, UnavailableVectorizer, Vector, Vectorizer};
pub use engine::{MatchSource, QueryResponse, SemanticCache, SemanticCacheBuilder};
pub use generation::{Generator, TemplateGenerator};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
