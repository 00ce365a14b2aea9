use crate::pricing::{PriceEntry, PriceTable};
use crate::types::TokenCounts;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Cost in USD of `tokens` at the rates in `price`.
///
/// Cached tokens are carved out of the input bill and charged at the cached
/// rate. When `cached > input` the regular input term is zero rather than
/// negative. No rounding is applied.
pub fn cost_for(price: &PriceEntry, tokens: &TokenCounts) -> f64 {
    let billable_input = tokens.input.saturating_sub(tokens.cached);
    billable_input as f64 / TOKENS_PER_MILLION * price.input_per_mtok
        + tokens.output as f64 / TOKENS_PER_MILLION * price.output_per_mtok
        + tokens.cached as f64 / TOKENS_PER_MILLION * price.cached_per_mtok
}

/// Price a request against `table`. Unknown models cost `0.0`.
pub fn compute_cost(table: &PriceTable, provider: &str, model: &str, tokens: &TokenCounts) -> f64 {
    match table.resolve(provider, model) {
        Some(price) => cost_for(price, tokens),
        None => {
            tracing::debug!(provider, model, "no price entry; recording at zero cost");
            0.0
        }
    }
}
