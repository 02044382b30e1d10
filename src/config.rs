//! Cache configuration.
//!
//! All values are read-only tunables: the engine consults them but never
//! changes them. A configuration can come from defaults, a YAML file, or
//! `SEMCACHE_*` environment variables.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_MAX_ENTRIES: &str = "SEMCACHE_MAX_ENTRIES";
pub const ENV_TTL_SECS: &str = "SEMCACHE_TTL_SECS";
pub const ENV_SIMILARITY_THRESHOLD: &str = "SEMCACHE_SIMILARITY_THRESHOLD";
pub const ENV_COST_PER_MILLION_TOKENS: &str = "SEMCACHE_COST_PER_MILLION_TOKENS";
pub const ENV_AVG_TOKENS_PER_REQUEST: &str = "SEMCACHE_AVG_TOKENS_PER_REQUEST";
pub const ENV_FALLBACK_DIMENSIONS: &str = "SEMCACHE_FALLBACK_DIMENSIONS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries held at once.
    pub max_entries: usize,
    /// Entry lifetime in seconds, measured from creation.
    pub ttl_secs: u64,
    /// Cosine similarity a semantic match must strictly exceed.
    pub similarity_threshold: f32,
    /// Model price used for savings estimates, in currency units per million tokens.
    pub cost_per_million_tokens: f64,
    pub avg_tokens_per_request: u64,
    /// Length of the zero vector stored when the vectorizer fails on insert.
    pub fallback_dimensions: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl_secs: 3600,
            similarity_threshold: 0.9,
            cost_per_million_tokens: 2.5,
            avg_tokens_per_request: 500,
            fallback_dimensions: 10,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_cost_per_million_tokens(mut self, cost: f64) -> Self {
        self.cost_per_million_tokens = cost;
        self
    }

    pub fn with_avg_tokens_per_request(mut self, tokens: u64) -> Self {
        self.avg_tokens_per_request = tokens;
        self
    }

    pub fn with_fallback_dimensions(mut self, dimensions: usize) -> Self {
        self.fallback_dimensions = dimensions;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid cache configuration: {}", e),
                ErrorContext::new().with_source("config"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to read configuration file: {}", e),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("config"),
            )
        })?;
        Self::from_yaml_str(&content)
    }

    /// Build a configuration from `SEMCACHE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_MAX_ENTRIES)? {
            config.max_entries = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_TTL_SECS)? {
            config.ttl_secs = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_SIMILARITY_THRESHOLD)? {
            config.similarity_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_COST_PER_MILLION_TOKENS)? {
            config.cost_per_million_tokens = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_AVG_TOKENS_PER_REQUEST)? {
            config.avg_tokens_per_request = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_FALLBACK_DIMENSIONS)? {
            config.fallback_dimensions = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(invalid("max_entries", "must be greater than zero"));
        }
        if !self.similarity_threshold.is_finite()
            || !(-1.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(invalid(
                "similarity_threshold",
                format!("must be within [-1, 1], got {}", self.similarity_threshold),
            ));
        }
        if !self.cost_per_million_tokens.is_finite() || self.cost_per_million_tokens < 0.0 {
            return Err(invalid(
                "cost_per_million_tokens",
                format!("must be non-negative, got {}", self.cost_per_million_tokens),
            ));
        }
        if self.fallback_dimensions == 0 {
            return Err(invalid("fallback_dimensions", "must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::configuration_with_context(
                format!("Cannot parse {:?}: {}", raw, e),
                ErrorContext::new()
                    .with_field_path(name)
                    .with_source("config"),
            )
        }),
    }
}

fn invalid(field: &str, details: impl Into<String>) -> Error {
    Error::configuration_with_context(
        format!("Invalid value for {}", field),
        ErrorContext::new()
            .with_field_path(field)
            .with_details(details)
            .with_source("config"),
    )
}
