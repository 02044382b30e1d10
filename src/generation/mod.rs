//! Answer generation contract.
//!
//! The cache calls a [`Generator`] only on a full miss. Whatever it returns is
//! cached; a failure is passed back to the caller and nothing is stored.

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, query: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Deterministic stand-in that echoes the query into a fixed template.
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    prefix: String,
}

impl TemplateGenerator {
    pub const DEFAULT_PREFIX: &'static str = "Review result for: ";

    pub fn new() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for TemplateGenerator {
    async fn generate(&self, query: &str) -> Result<String> {
        Ok(format!("{}{}", self.prefix, query))
    }
    fn name(&self) -> &'static str {
        "template"
    }
}
