//! Exact and semantic matching over an [`EntryStore`].
//!
//! Both matchers prune expired entries they come across and promote the entry
//! they return, so a "read" always mutates the store.

use super::entry::CacheEntry;
use super::key::CacheKey;
use super::store::EntryStore;
use crate::embeddings::cosine_similarity;
use std::time::Instant;
use tracing::debug;

/// A semantic hit together with the similarity that qualified it.
#[derive(Debug, Clone)]
pub struct SemanticMatch {
    pub entry: CacheEntry,
    pub similarity: f32,
}

pub fn match_exact(store: &mut EntryStore, key: &CacheKey, now: Instant) -> Option<CacheEntry> {
    let expired = store.peek(key).map(|e| store.is_expired(e, now))?;
    if expired {
        store.remove(key);
        debug!(key = %key, "removed expired entry on exact lookup");
        return None;
    }
    store.touch(key, now).cloned()
}

/// Linear scan from least to most recently used.
///
/// Returns the first live entry whose similarity strictly exceeds `threshold`,
/// not the best one. Entries with a zero-norm or mismatched embedding never match.
/// The scan stops at the hit; expired entries past it are left for a later scan.
pub fn match_semantic(
    store: &mut EntryStore,
    query_embedding: &[f32],
    threshold: f32,
    now: Instant,
) -> Option<SemanticMatch> {
    let mut expired = Vec::new();
    let mut hit = None;
    for (key, entry) in store.iter_by_recency() {
        if store.is_expired(entry, now) {
            expired.push(key.clone());
            continue;
        }
        if let Ok(Some(similarity)) = cosine_similarity(query_embedding, entry.embedding()) {
            if similarity > threshold {
                hit = Some((key.clone(), similarity));
                break;
            }
        }
    }

    for key in &expired {
        store.remove(key);
        debug!(key = %key, "removed expired entry during semantic scan");
    }

    let (key, similarity) = hit?;
    let entry = store.touch(&key, now)?.clone();
    Some(SemanticMatch { entry, similarity })
}
