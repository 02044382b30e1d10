//! 缓存分析模块：命中率与成本节省统计。
//!
//! # Cache Analytics
//!
//! Counts hits and misses reported by the cache engine and derives hit rate and
//! estimated cost savings from them.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Analytics`] | Running request, hit and miss counters |
//! | [`CacheStats`] | Serializable snapshot with derived metrics |
//! | [`SavingsModel`] | Token pricing used to estimate savings |
//!
//! Counters only grow. There is no reset; a fresh engine starts from zero.

mod pricing;

pub use pricing::SavingsModel;

use serde::{Deserialize, Serialize};

/// Matching and eviction strategies reported with every snapshot.
pub const STRATEGIES: [&str; 4] = [
    "exact match",
    "semantic similarity",
    "LRU eviction",
    "TTL expiration",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analytics {
    total_requests: u64,
    cache_hits: u64,
    cache_misses: u64,
}

impl Analytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.total_requests += 1;
        self.cache_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.total_requests += 1;
        self.cache_misses += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses
    }

    pub fn get_stats(&self, cache_size: usize, savings: &SavingsModel) -> CacheStats {
        let hit_rate = if self.total_requests > 0 {
            self.cache_hits as f64 / self.total_requests as f64
        } else {
            0.0
        };
        CacheStats {
            hit_rate: round2(hit_rate),
            total_requests: self.total_requests,
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            cache_size,
            cost_savings: round2(savings.savings_for(self.cache_hits)),
            savings_percent: round2(hit_rate * 100.0),
            strategies: STRATEGIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hit_rate: f64,
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_size: usize,
    pub cost_savings: f64,
    pub savings_percent: f64,
    pub strategies: Vec<String>,
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
