//! 语义缓存核心：规范化键、条目存储、精确与语义匹配。
//!
//! # Cache Core
//!
//! Building blocks of the semantic cache, independent of any vectorizer or
//! generator.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`normalize`] / [`derive_key`] | Canonical query text and its SHA-256 key |
//! | [`CacheKey`] | Fixed-length digest of a normalized query |
//! | [`CacheEntry`] | Query, answer, embedding and timestamps |
//! | [`EntryStore`] | Recency-ordered map with capacity eviction and TTL checks |
//! | [`match_exact`] | Key lookup with lazy expiration |
//! | [`match_semantic`] | Cosine-similarity scan with lazy expiration |
//!
//! ## Expiration and Eviction
//!
//! Nothing runs in the background. An entry is checked against the TTL only
//! when a lookup reaches it, and capacity is enforced only when a new key is
//! inserted. The two mechanisms are independent: an entry can be evicted long
//! before it expires, or sit expired until some lookup touches it.

mod entry;
mod key;
mod matcher;
mod store;

pub use entry::CacheEntry;
pub use key::{derive_key, normalize, CacheKey};
pub use matcher::{match_exact, match_semantic, SemanticMatch};
pub use store::EntryStore;
