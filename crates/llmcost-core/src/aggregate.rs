//! Folding usage records into report totals and budget figures.

use crate::types::UsageRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Budget share at which status turns to a warning, in percent.
pub const DEFAULT_WARN_THRESHOLD: f64 = 80.0;

/// Cells in the budget progress bar.
pub const BAR_WIDTH: usize = 30;

/// Subtotal for one provider or one `provider/model` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub cost: f64,
    pub entries: usize,
}

/// Totals over a set of usage records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    pub cost: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cached_tokens: u64,
    pub entries: usize,
    /// Per-provider subtotals in order of first appearance.
    pub by_provider: Vec<GroupTotal>,
    /// Per-`provider/model` subtotals in order of first appearance.
    pub by_model: Vec<GroupTotal>,
}

impl UsageTotals {
    pub fn from_records(records: &[UsageRecord]) -> Self {
        let mut totals = Self::default();
        let mut provider_idx: HashMap<String, usize> = HashMap::new();
        let mut model_idx: HashMap<String, usize> = HashMap::new();

        for r in records {
            totals.cost += r.cost;
            totals.input_tokens = totals.input_tokens.saturating_add(r.input_tokens);
            totals.output_tokens = totals.output_tokens.saturating_add(r.output_tokens);
            totals.cached_tokens = totals.cached_tokens.saturating_add(r.cached_tokens);
            totals.entries += 1;

            add_to_group(&mut totals.by_provider, &mut provider_idx, &r.provider, r.cost);
            let model_key = format!("{}/{}", r.provider, r.model);
            add_to_group(&mut totals.by_model, &mut model_idx, &model_key, r.cost);
        }
        totals
    }

    /// Percentage of the total cost represented by `cost` (0 when nothing was spent).
    pub fn share(&self, cost: f64) -> f64 {
        if self.cost > 0.0 {
            cost / self.cost * 100.0
        } else {
            0.0
        }
    }
}

fn add_to_group(
    groups: &mut Vec<GroupTotal>,
    index: &mut HashMap<String, usize>,
    key: &str,
    cost: f64,
) {
    match index.get(key) {
        Some(&i) => {
            groups[i].cost += cost;
            groups[i].entries += 1;
        }
        None => {
            index.insert(key.to_string(), groups.len());
            groups.push(GroupTotal {
                key: key.to_string(),
                cost,
                entries: 1,
            });
        }
    }
}

/// `spent / limit * 100`, unclamped. `None` when the limit is not positive.
pub fn budget_percentage(spent: f64, limit: f64) -> Option<f64> {
    if limit > 0.0 {
        Some(spent / limit * 100.0)
    } else {
        None
    }
}

/// Filled cells of a `width`-cell progress bar for `percentage`, clamped to `0..=width`.
pub fn bar_fill(percentage: f64, width: usize) -> usize {
    if percentage.is_nan() || percentage <= 0.0 {
        return 0;
    }
    let filled = (percentage / 100.0 * width as f64) as usize;
    filled.min(width)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    Ok,
    Warning,
    Over,
}

/// Month-to-date spend compared against the configured limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub spent: f64,
    pub limit: f64,
    pub percentage: Option<f64>,
    pub level: BudgetLevel,
}

impl BudgetStatus {
    pub fn evaluate(spent: f64, limit: f64, warn_threshold: f64) -> Self {
        let percentage = budget_percentage(spent, limit);
        let level = match percentage {
            Some(pct) if pct >= 100.0 => BudgetLevel::Over,
            Some(pct) if pct >= warn_threshold => BudgetLevel::Warning,
            Some(_) => BudgetLevel::Ok,
            // A zero limit is exceeded by any spend at all.
            None if spent > 0.0 => BudgetLevel::Over,
            None => BudgetLevel::Ok,
        };
        Self {
            spent,
            limit,
            percentage,
            level,
        }
    }

    pub fn bar_fill(&self, width: usize) -> usize {
        match (self.percentage, self.level) {
            (Some(pct), _) => bar_fill(pct, width),
            (None, BudgetLevel::Over) => width,
            (None, _) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn rec(
        id: i64,
        provider: &str,
        model: &str,
        input: u64,
        output: u64,
        cost: f64,
    ) -> UsageRecord {
        UsageRecord {
            id,
            timestamp: datetime!(2026-10-01 0:00 UTC),
            provider: provider.into(),
            model: model.into(),
            input_tokens: input,
            output_tokens: output,
            cached_tokens: 0,
            cost,
        }
    }

    #[test]
    fn totals_and_groups() {
        let records = vec![
            rec(3, "openai", "gpt-4o", 10_000, 2_000, 0.045),
            rec(2, "anthropic", "claude-opus-4-6", 1_000, 100, 0.0225),
            rec(1, "openai", "gpt-4o-mini", 5_000, 500, 0.00105),
            rec(0, "openai", "gpt-4o", 1_000, 0, 0.0025),
        ];
        let t = UsageTotals::from_records(&records);
        assert_eq!(t.entries, 4);
        assert_eq!(t.input_tokens, 17_000);
        assert_eq!(t.output_tokens, 2_600);
        assert!((t.cost - 0.07105).abs() < 1e-12);

        let providers: Vec<&str> = t.by_provider.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(providers, ["openai", "anthropic"]);
        assert!((t.by_provider[0].cost - 0.04855).abs() < 1e-12);
        assert_eq!(t.by_provider[0].entries, 3);

        let models: Vec<&str> = t.by_model.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(models, ["openai/gpt-4o", "anthropic/claude-opus-4-6", "openai/gpt-4o-mini"]);
        assert!((t.by_model[0].cost - 0.0475).abs() < 1e-12);
    }

    #[test]
    fn empty_totals() {
        let t = UsageTotals::from_records(&[]);
        assert_eq!(t, UsageTotals::default());
        assert_eq!(t.share(1.0), 0.0);
    }

    #[test]
    fn share_of_total() {
        let t = UsageTotals::from_records(&[
            rec(1, "a", "x", 0, 0, 1.0),
            rec(2, "b", "y", 0, 0, 3.0),
        ]);
        assert!((t.share(t.by_provider[1].cost) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn percentage_is_not_clamped() {
        assert_eq!(budget_percentage(150.0, 100.0), Some(150.0));
        assert_eq!(budget_percentage(25.0, 50.0), Some(50.0));
        assert_eq!(budget_percentage(1.0, 0.0), None);
    }

    #[test]
    fn bar_fill_clamps() {
        assert_eq!(bar_fill(0.0, BAR_WIDTH), 0);
        assert_eq!(bar_fill(50.0, BAR_WIDTH), 15);
        assert_eq!(bar_fill(99.0, BAR_WIDTH), 29);
        assert_eq!(bar_fill(250.0, BAR_WIDTH), BAR_WIDTH);
        assert_eq!(bar_fill(f64::NAN, BAR_WIDTH), 0);
    }

    #[test]
    fn budget_levels() {
        let t = DEFAULT_WARN_THRESHOLD;
        assert_eq!(BudgetStatus::evaluate(10.0, 50.0, t).level, BudgetLevel::Ok);
        assert_eq!(BudgetStatus::evaluate(40.0, 50.0, t).level, BudgetLevel::Warning);
        assert_eq!(BudgetStatus::evaluate(50.0, 50.0, t).level, BudgetLevel::Over);
        let over = BudgetStatus::evaluate(75.0, 50.0, t);
        assert_eq!(over.percentage, Some(150.0));
        assert_eq!(over.bar_fill(BAR_WIDTH), BAR_WIDTH);
    }

    #[test]
    fn custom_warn_threshold() {
        assert_eq!(BudgetStatus::evaluate(30.0, 50.0, 50.0).level, BudgetLevel::Warning);
        assert_eq!(BudgetStatus::evaluate(30.0, 50.0, 90.0).level, BudgetLevel::Ok);
    }

    #[test]
    fn zero_limit() {
        let idle = BudgetStatus::evaluate(0.0, 0.0, DEFAULT_WARN_THRESHOLD);
        assert_eq!(idle.percentage, None);
        assert_eq!(idle.level, BudgetLevel::Ok);
        assert_eq!(idle.bar_fill(BAR_WIDTH), 0);

        let spent = BudgetStatus::evaluate(0.01, 0.0, DEFAULT_WARN_THRESHOLD);
        assert_eq!(spent.level, BudgetLevel::Over);
        assert_eq!(spent.bar_fill(BAR_WIDTH), BAR_WIDTH);
    }
}
