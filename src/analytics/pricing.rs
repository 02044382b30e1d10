//! Model pricing and savings estimation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsModel {
    pub model: String,
    pub cost_per_million_tokens: f64,
    pub avg_tokens_per_request: u64,
    pub currency: String,
}

impl SavingsModel {
    pub fn new(model: &str, cost_per_million_tokens: f64, avg_tokens_per_request: u64) -> Self {
        Self {
            model: model.into(),
            cost_per_million_tokens,
            avg_tokens_per_request,
            currency: "USD".into(),
        }
    }

    pub fn with_avg_tokens_per_request(mut self, tokens: u64) -> Self {
        self.avg_tokens_per_request = tokens;
        self
    }

    /// Unrounded cost of the generator calls that `hits` cache hits avoided.
    pub fn savings_for(&self, hits: u64) -> f64 {
        hits as f64 * self.avg_tokens_per_request as f64 * self.cost_per_million_tokens
            / 1_000_000.0
    }

    pub fn format(&self, amount: f64) -> String {
        format!("{} {:.2}", self.currency, amount)
    }

    pub fn gpt_4o() -> Self {
        Self::new("gpt-4o", 5.0, 0)
    }
    pub fn gpt_4o_mini() -> Self {
        Self::new("gpt-4o-mini", 0.15, 0)
    }
    pub fn claude_35_sonnet() -> Self {
        Self::new("claude-3-5-sonnet", 3.0, 0)
    }
    pub fn claude_3_haiku() -> Self {
        Self::new("claude-3-haiku", 0.25, 0)
    }

    /// Preset input pricing by model name. The average request size is left at
    /// zero; set it with [`with_avg_tokens_per_request`](Self::with_avg_tokens_per_request).
    pub fn for_model(model: &str) -> Option<Self> {
        let m = model.to_lowercase();
        if m.contains("gpt-4o-mini") {
            Some(Self::gpt_4o_mini())
        } else if m.contains("gpt-4o") {
            Some(Self::gpt_4o())
        } else if m.contains("claude-3-5-sonnet") {
            Some(Self::claude_35_sonnet())
        } else if m.contains("claude-3-haiku") {
            Some(Self::claude_3_haiku())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_savings_for_hits() {
        let model = SavingsModel::new("custom", 2.0, 500);
        // 10 * 500 * 2.0 / 1e6
        assert!((model.savings_for(10) - 0.01).abs() < 1e-12);
        assert_eq!(model.savings_for(0), 0.0);
    }

    #[test]
    fn test_for_model_prefers_specific_match() {
        assert_eq!(
            SavingsModel::for_model("openai/GPT-4o-mini").unwrap().model,
            "gpt-4o-mini"
        );
        assert_eq!(SavingsModel::for_model("gpt-4o").unwrap().cost_per_million_tokens, 5.0);
        assert!(SavingsModel::for_model("llama-3").is_none());
    }

    #[test]
    fn test_format() {
        let model = SavingsModel::gpt_4o().with_avg_tokens_per_request(1000);
        assert_eq!(model.format(1.234), "USD 1.23");
        assert_eq!(model.avg_tokens_per_request, 1000);
    }
}
