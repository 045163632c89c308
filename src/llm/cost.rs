//! Token pricing for LLM usage.
//!
//! Every model is billed at one flat rate per million total tokens. The rate
//! is configurable; costs are kept in dollars as `f64` and accumulated by the
//! caller.

/// Default price in dollars per one million tokens.
pub const DEFAULT_COST_PER_MILLION_TOKENS: f64 = 2.00;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Flat per-token pricing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    /// Dollars charged per one million tokens.
    pub per_million_tokens: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            per_million_tokens: DEFAULT_COST_PER_MILLION_TOKENS,
        }
    }
}

impl Pricing {
    /// Creates pricing with the given rate. Negative rates are clamped to zero
    /// so that accumulated case cost can never decrease.
    pub fn new(per_million_tokens: f64) -> Self {
        Self {
            per_million_tokens: per_million_tokens.max(0.0),
        }
    }

    /// Cost in dollars for `tokens` total tokens.
    ///
    /// ```
    /// use jury::llm::cost::Pricing;
    ///
    /// let pricing = Pricing::default();
    /// assert!((pricing.cost_for(500_000) - 1.0).abs() < 1e-12);
    /// ```
    pub fn cost_for(&self, tokens: u64) -> f64 {
        (tokens as f64 / TOKENS_PER_MILLION) * self.per_million_tokens
    }
}
