//! Cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Canonical form of a query: outer whitespace trimmed, lowercased.
pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// SHA-256 hex digest of already-normalized text.
pub fn derive_key(normalized: &str) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let hash: String = hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    CacheKey(hash)
}

/// Fixed-length digest identifying a normalized query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_query(query: &str) -> Self {
        derive_key(&normalize(query))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
