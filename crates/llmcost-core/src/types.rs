use crate::cost::compute_cost;
use crate::pricing::PriceTable;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Token counts reported for a single API request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
    /// Portion of `input` served from the provider's prompt cache.
    /// Not checked against `input`; pricing clamps instead.
    #[serde(default)]
    pub cached: u64,
}

impl TokenCounts {
    pub fn new(input: u64, output: u64, cached: u64) -> Self {
        Self {
            input,
            output,
            cached,
        }
    }
}

/// A usage entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUsage {
    pub timestamp: OffsetDateTime,
    pub provider: String,
    pub model: String,
    pub tokens: TokenCounts,
    pub cost: f64,
}

impl NewUsage {
    /// Price `tokens` against `table` and stamp the entry with the current UTC time.
    pub fn priced(table: &PriceTable, provider: &str, model: &str, tokens: TokenCounts) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            provider: provider.to_string(),
            model: model.to_string(),
            tokens,
            cost: compute_cost(table, provider, model, &tokens),
        }
    }
}

/// A persisted usage row (one line in the `usage` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub provider: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cached_tokens: u64,
    pub cost: f64,
}

impl UsageRecord {
    pub fn tokens(&self) -> TokenCounts {
        TokenCounts::new(self.input_tokens, self.output_tokens, self.cached_tokens)
    }
}

/// Conjunctive filter for usage queries. `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageFilter {
    /// Inclusive lower bound on the record timestamp.
    pub since: Option<OffsetDateTime>,
    /// Exact (case-sensitive) provider match.
    pub provider: Option<String>,
    /// Exact (case-sensitive) model match.
    pub model: Option<String>,
}

impl UsageFilter {
    pub fn since(since: OffsetDateTime) -> Self {
        Self {
            since: Some(since),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.since.is_none() && self.provider.is_none() && self.model.is_none()
    }
}
