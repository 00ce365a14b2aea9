//! Colored terminal rendering for reports, budget status, and the price table.

use colored::{ColoredString, Colorize};
use llmcost_core::aggregate::BAR_WIDTH;
use llmcost_core::{BudgetLevel, BudgetStatus, Period, PriceTable, UsageRecord, UsageTotals};
use std::io::{self, Write};

fn title(s: &str) -> ColoredString {
    s.truecolor(0x58, 0xa6, 0xff).bold()
}

fn green(s: &str) -> ColoredString {
    s.truecolor(0x39, 0xd3, 0x53)
}

fn dim(s: &str) -> ColoredString {
    s.truecolor(0x8b, 0x94, 0x9e)
}

fn warn(s: &str) -> ColoredString {
    s.truecolor(0xf0, 0x88, 0x3e)
}

fn error(s: &str) -> ColoredString {
    s.truecolor(0xf8, 0x51, 0x49)
}

fn header(s: &str) -> ColoredString {
    s.truecolor(0xc9, 0xd1, 0xd9).bold().underline()
}

fn usd(amount: f64, decimals: usize) -> String {
    format!("${amount:.decimals$}")
}

/// Table report: totals, then per-provider and per-model subtotals.
pub fn report<W: Write>(out: &mut W, entries: &[UsageRecord], period: Period) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title(&format!("  Cost Report ({period})")))?;
    writeln!(out)?;

    if entries.is_empty() {
        writeln!(out, "{}", dim("  No usage data found."))?;
        writeln!(out)?;
        return Ok(());
    }

    let totals = UsageTotals::from_records(entries);

    writeln!(out, "  Total cost:      {}", green(&usd(totals.cost, 4)))?;
    let cached = if totals.cached_tokens > 0 {
        format!(" ({} cached)", totals.cached_tokens)
    } else {
        String::new()
    };
    writeln!(
        out,
        "  Total tokens:    {} in / {} out{}",
        totals.input_tokens.to_string().bold(),
        totals.output_tokens.to_string().bold(),
        dim(&cached)
    )?;
    writeln!(out, "  Entries:         {}", totals.entries)?;
    writeln!(out)?;

    writeln!(out, "{}", header("  By Provider"))?;
    for g in &totals.by_provider {
        writeln!(
            out,
            "    {} {}  ({})",
            format!("{:<15}", g.key).bold(),
            green(&usd(g.cost, 4)),
            dim(&format!("{:.1}%", totals.share(g.cost)))
        )?;
    }
    writeln!(out)?;

    writeln!(out, "{}", header("  By Model"))?;
    for g in &totals.by_model {
        writeln!(
            out,
            "    {} {}",
            dim(&format!("{:<40}", g.key)),
            green(&usd(g.cost, 4))
        )?;
    }
    writeln!(out)?;
    Ok(())
}

/// Budget status with a progress bar colored by level.
pub fn budget<W: Write>(out: &mut W, status: &BudgetStatus) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title("  Budget Status"))?;
    writeln!(out)?;

    let filled = status.bar_fill(BAR_WIDTH);
    let bar_style: fn(&str) -> ColoredString = match status.level {
        BudgetLevel::Ok => green,
        BudgetLevel::Warning => warn,
        BudgetLevel::Over => error,
    };
    let bar = format!(
        "{}{}",
        bar_style(&"█".repeat(filled)),
        dim(&"░".repeat(BAR_WIDTH - filled))
    );
    let pct = match status.percentage {
        Some(p) => format!("{p:.1}%"),
        None => "n/a".to_string(),
    };

    writeln!(
        out,
        "  Spent:   {} / {}",
        green(&usd(status.spent, 4)),
        usd(status.limit, 2)
    )?;
    writeln!(out, "  Used:    [{bar}] {pct}")?;

    match status.level {
        BudgetLevel::Over => writeln!(out, "{}", error("  OVER BUDGET"))?,
        BudgetLevel::Warning => {
            writeln!(out, "{}", warn("  WARNING: Approaching budget limit"))?
        }
        BudgetLevel::Ok => {}
    }
    writeln!(out)?;
    Ok(())
}

/// The price table grouped by provider.
pub fn models<W: Write>(out: &mut W, table: &PriceTable) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title("  Supported Models"))?;
    writeln!(out)?;

    for (provider, entries) in table.by_provider() {
        writeln!(out, "{}", header(&format!("  {}", provider.to_uppercase())))?;
        for m in entries {
            let cached = if m.cached_per_mtok > 0.0 {
                format!(" (cached: ${:.3})", m.cached_per_mtok)
            } else {
                String::new()
            };
            writeln!(
                out,
                "    {} {} in / {} out{}",
                format!("{:<35}", m.model).bold(),
                green(&usd(m.input_per_mtok, 3)),
                green(&usd(m.output_per_mtok, 3)),
                dim(&cached)
            )?;
        }
    }
    writeln!(out)?;
    Ok(())
}
