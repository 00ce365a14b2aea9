use crate::Context;
use anyhow::Context as _;
use llmcost_core::{NewUsage, TokenCounts};

/// `llm-cost track`
pub fn execute(
    ctx: &Context,
    provider: &str,
    model: &str,
    tokens: TokenCounts,
) -> anyhow::Result<()> {
    let (_, entry) = record(ctx, provider, model, tokens)?;
    println!(
        "Recorded: {provider}/{model} | {} in + {} out = ${:.6}",
        tokens.input, tokens.output, entry.cost
    );
    Ok(())
}

/// Price and persist one request. Unknown models are recorded at zero cost.
pub fn record(
    ctx: &Context,
    provider: &str,
    model: &str,
    tokens: TokenCounts,
) -> anyhow::Result<(i64, NewUsage)> {
    let store = ctx.open_store()?;
    let entry = NewUsage::priced(&ctx.prices, provider, model, tokens);
    let id = store.record_usage(&entry).context("record usage")?;
    Ok((id, entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_context;
    use llmcost_core::UsageFilter;

    #[test]
    fn records_priced_entry() {
        let (_dir, ctx) = temp_context();
        let tokens = TokenCounts::new(10_000, 2_000, 0);
        let (id, entry) = record(&ctx, "openai", "gpt-4o", tokens).unwrap();
        assert!((entry.cost - 0.045).abs() < 1e-12);

        let rows = ctx.open_store().unwrap().query_usage(&UsageFilter::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].model, "gpt-4o");
    }

    #[test]
    fn unknown_model_recorded_at_zero() {
        let (_dir, ctx) = temp_context();
        let tokens = TokenCounts::new(1_000, 1_000, 0);
        let (_, entry) = record(&ctx, "mistral", "large", tokens).unwrap();
        assert_eq!(entry.cost, 0.0);
        let rows = ctx.open_store().unwrap().query_usage(&UsageFilter::default()).unwrap();
        assert_eq!(rows[0].provider, "mistral");
        assert_eq!(rows[0].cost, 0.0);
    }

    #[test]
    fn keeps_names_as_typed() {
        // Pricing resolves the partial name, but the record keeps what the user typed.
        let (_dir, ctx) = temp_context();
        let tokens = TokenCounts::new(1_500, 500, 0);
        let (_, entry) = record(&ctx, "anthropic", "sonnet", tokens).unwrap();
        assert!((entry.cost - 0.012).abs() < 1e-12);
        let rows = ctx.open_store().unwrap().query_usage(&UsageFilter::default()).unwrap();
        assert_eq!(rows[0].model, "sonnet");
    }

    #[test]
    fn unwritable_database_errors() {
        let (dir, mut ctx) = temp_context();
        // A directory is not a database file.
        ctx.db_flag = Some(dir.path().to_path_buf());
        assert!(record(&ctx, "openai", "gpt-4o", TokenCounts::default()).is_err());
    }
}
