use crate::{render, Context};
use anyhow::Context as _;
use llmcost_core::period::month_start;
use llmcost_core::{BudgetStatus, UsageFilter};
use llmcost_ledger::UsageStore;
use std::io;
use time::OffsetDateTime;

/// Clap value parser for `--limit`: a finite, non-negative USD amount.
pub fn parse_limit(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .trim()
        .trim_start_matches('$')
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if !v.is_finite() || v < 0.0 {
        return Err(format!("budget limit must be a non-negative amount, got '{s}'"));
    }
    Ok(v)
}

/// `llm-cost budget set --limit <amount>`
pub fn set(ctx: &Context, limit: f64) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    store.set_budget(limit).context("set budget")?;
    println!("Monthly budget set to ${limit:.2}");
    Ok(())
}

/// `llm-cost budget status`
pub fn status(ctx: &Context) -> anyhow::Result<()> {
    let warn_threshold = ctx.config()?.warn_threshold();
    let store = ctx.open_store()?;
    match evaluate(&store, warn_threshold, OffsetDateTime::now_utc())? {
        Some(status) => render::budget(&mut io::stdout().lock(), &status)?,
        None => println!("No budget set. Use: llm-cost budget set --limit <amount>"),
    }
    Ok(())
}

/// Month-to-date spend against the stored limit, or `None` when no budget is set.
pub fn evaluate(
    store: &UsageStore,
    warn_threshold: f64,
    now: OffsetDateTime,
) -> anyhow::Result<Option<BudgetStatus>> {
    let Some(limit) = store.get_budget().context("read budget")? else {
        return Ok(None);
    };
    let entries = store
        .query_usage(&UsageFilter::since(month_start(now)))
        .context("query usage")?;
    let spent: f64 = entries.iter().map(|e| e.cost).sum();
    tracing::debug!(spent, limit, entries = entries.len(), "budget status");
    Ok(Some(BudgetStatus::evaluate(spent, limit, warn_threshold)))
}
