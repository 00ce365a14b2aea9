use crate::{render, Context};
use anyhow::Context as _;
use clap::ValueEnum;
use llmcost_core::{Period, UsageFilter, UsageRecord};
use std::io::{self, Write};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
    Csv,
}

pub struct ReportParams<'a> {
    pub period: Period,
    pub provider: Option<&'a str>,
    pub model: Option<&'a str>,
    pub format: ReportFormat,
}

/// Translate report flags into a store filter. Blank filter values match everything.
pub fn build_filter(params: &ReportParams<'_>, now: OffsetDateTime) -> UsageFilter {
    let non_empty = |s: Option<&str>| s.filter(|v| !v.is_empty()).map(str::to_string);
    UsageFilter {
        since: params.period.since(now),
        provider: non_empty(params.provider),
        model: non_empty(params.model),
    }
}

/// `llm-cost report`
pub fn execute(ctx: &Context, params: &ReportParams<'_>) -> anyhow::Result<()> {
    let filter = build_filter(params, OffsetDateTime::now_utc());
    let store = ctx.open_store()?;
    let entries = store.query_usage(&filter).context("query usage")?;
    tracing::debug!(period = %params.period, rows = entries.len(), "report");

    let mut out = io::stdout().lock();
    match params.format {
        ReportFormat::Table => render::report(&mut out, &entries, params.period)?,
        ReportFormat::Json => write_json(&mut out, &entries)?,
        ReportFormat::Csv => write_csv(&mut out, &entries)?,
    }
    Ok(())
}

/// Pretty-printed JSON array of the raw entries.
pub fn write_json<W: Write>(out: &mut W, entries: &[UsageRecord]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, entries)?;
    writeln!(out)?;
    Ok(())
}

/// One CSV row per entry, newest first, with a header row.
pub fn write_csv<W: Write>(out: &mut W, entries: &[UsageRecord]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "timestamp",
        "provider",
        "model",
        "input_tokens",
        "output_tokens",
        "cached_tokens",
        "cost",
    ])?;
    for e in entries {
        wtr.write_record([
            e.timestamp.format(&Rfc3339)?,
            e.provider.clone(),
            e.model.clone(),
            e.input_tokens.to_string(),
            e.output_tokens.to_string(),
            e.cached_tokens.to_string(),
            format!("{:.6}", e.cost),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
