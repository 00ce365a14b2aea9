mod cmd_budget;
mod cmd_config;
mod cmd_models;
mod cmd_report;
mod cmd_track;
mod render;
#[cfg(test)]
mod test_support;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use llmcost_core::{Period, PriceTable, TokenCounts};
use llmcost_ledger::UsageStore;
use llmcost_store::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`, `llmcost_ledger=info`).
const LOG_ENV: &str = "LLM_COST_LOG";

#[derive(Parser)]
#[command(
    name = "llm-cost",
    version,
    about = "Multi-provider LLM API cost tracker",
    long_about = "Track token usage and costs across OpenAI, Anthropic, Groq, Google, and DeepSeek from the terminal."
)]
struct Cli {
    /// SQLite database path (default: $LLM_COST_DB, config db_path, or ~/.llm-cost.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a usage entry
    #[command(after_help = "Examples:
  llm-cost track --provider anthropic --model claude-sonnet-4-5-20250929 --input-tokens 1500 --output-tokens 500
  llm-cost track -p openai -m gpt-4o -i 10000 -o 2000")]
    Track {
        /// Provider (openai, anthropic, groq, google, deepseek)
        #[arg(short, long)]
        provider: String,
        /// Model name (full or partial)
        #[arg(short, long)]
        model: String,
        /// Input token count
        #[arg(short, long)]
        input_tokens: u64,
        /// Output token count
        #[arg(short, long)]
        output_tokens: u64,
        /// Cached input token count
        #[arg(short, long, default_value_t = 0)]
        cached_tokens: u64,
    },
    /// Show cost reports
    #[command(after_help = "Examples:
  llm-cost report --period today
  llm-cost report --period month --provider anthropic
  llm-cost report --period week --format json")]
    Report {
        /// Time period: today, week, month, all (default from config, else month)
        #[arg(long)]
        period: Option<Period>,
        /// Filter by provider (exact match)
        #[arg(long)]
        provider: Option<String>,
        /// Filter by model (exact match)
        #[arg(long)]
        model: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = cmd_report::ReportFormat::Table)]
        format: cmd_report::ReportFormat,
    },
    /// Manage monthly budget
    Budget {
        #[command(subcommand)]
        cmd: BudgetCmd,
    },
    /// List supported models and pricing
    Models,
    /// Read or change settings in config.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

#[derive(Subcommand)]
enum BudgetCmd {
    /// Set monthly budget limit
    #[command(after_help = "Example:\n  llm-cost budget set --limit 50.00")]
    Set {
        /// Monthly budget limit in USD
        #[arg(long, value_parser = cmd_budget::parse_limit)]
        limit: f64,
    },
    /// Show budget status
    Status,
}

/// Everything a command needs, built once in `main`. The config file is
/// read on demand so commands that don't use it work even when it is broken.
pub(crate) struct Context {
    pub config_path: PathBuf,
    pub prices: PriceTable,
    pub db_flag: Option<PathBuf>,
}

impl Context {
    fn new(db_flag: Option<PathBuf>) -> Self {
        Self {
            config_path: llmcost_store::config_path(),
            prices: PriceTable::builtin(),
            db_flag,
        }
    }

    pub fn config(&self) -> anyhow::Result<Config> {
        Config::load(&self.config_path).context("load config")
    }

    /// `--db`, then `LLM_COST_DB`, then config `db_path`, then the default.
    /// The config file is not read when the flag or env var decides.
    pub fn db_path(&self) -> anyhow::Result<PathBuf> {
        let env = std::env::var_os(llmcost_store::DB_ENV).filter(|v| !v.is_empty());
        let config = if self.db_flag.is_some() || env.is_some() {
            Config::default()
        } else {
            self.config()?
        };
        Ok(llmcost_store::resolve_db_path(
            self.db_flag.as_deref(),
            env,
            &config,
        ))
    }

    pub fn open_store(&self) -> anyhow::Result<UsageStore> {
        let db_path = self.db_path()?;
        tracing::debug!(db = %db_path.display(), "opening store");
        UsageStore::open_or_create(&db_path).context("open database")
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::new(cli.db);

    match cli.cmd {
        Command::Track {
            provider,
            model,
            input_tokens,
            output_tokens,
            cached_tokens,
        } => cmd_track::execute(
            &ctx,
            &provider,
            &model,
            TokenCounts::new(input_tokens, output_tokens, cached_tokens),
        ),
        Command::Report {
            period,
            provider,
            model,
            format,
        } => cmd_report::execute(
            &ctx,
            &cmd_report::ReportParams {
                period: match period {
                    Some(p) => p,
                    None => ctx.config()?.period(),
                },
                provider: provider.as_deref(),
                model: model.as_deref(),
                format,
            },
        ),
        Command::Budget { cmd } => match cmd {
            BudgetCmd::Set { limit } => cmd_budget::set(&ctx, limit),
            BudgetCmd::Status => cmd_budget::status(&ctx),
        },
        Command::Models => cmd_models::execute(&ctx),
        Command::Config { cmd } => cmd_config::run(cmd, &ctx.config_path),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn track_short_flags() {
        let cli = Cli::try_parse_from([
            "llm-cost", "track", "-p", "openai", "-m", "gpt-4o", "-i", "10000", "-o", "2000",
        ])
        .unwrap();
        match cli.cmd {
            Command::Track {
                provider,
                model,
                input_tokens,
                output_tokens,
                cached_tokens,
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(model, "gpt-4o");
                assert_eq!(input_tokens, 10_000);
                assert_eq!(output_tokens, 2_000);
                assert_eq!(cached_tokens, 0);
            }
            _ => panic!("expected track"),
        }
    }

    #[test]
    fn track_requires_token_counts() {
        assert!(
            Cli::try_parse_from(["llm-cost", "track", "-p", "openai", "-m", "gpt-4o"]).is_err()
        );
        assert!(Cli::try_parse_from([
            "llm-cost", "track", "-p", "openai", "-m", "gpt-4o", "-i", "-5", "-o", "1"
        ])
        .is_err());
    }

    #[test]
    fn report_defaults() {
        let cli = Cli::try_parse_from(["llm-cost", "report"]).unwrap();
        match cli.cmd {
            Command::Report {
                period,
                provider,
                format,
                ..
            } => {
                assert_eq!(period, None);
                assert_eq!(provider, None);
                assert_eq!(format, cmd_report::ReportFormat::Table);
            }
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn report_rejects_unknown_period_and_format() {
        assert!(Cli::try_parse_from(["llm-cost", "report", "--period", "year"]).is_err());
        assert!(Cli::try_parse_from(["llm-cost", "report", "--format", "xml"]).is_err());
        let cli = Cli::try_parse_from(["llm-cost", "report", "--period", "week", "--format", "csv"])
            .unwrap();
        assert!(matches!(
            cli.cmd,
            Command::Report {
                period: Some(Period::Week),
                format: cmd_report::ReportFormat::Csv,
                ..
            }
        ));
    }

    #[test]
    fn global_db_flag() {
        let cli = Cli::try_parse_from(["llm-cost", "models", "--db", "/tmp/x.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn budget_set_requires_limit() {
        assert!(Cli::try_parse_from(["llm-cost", "budget", "set"]).is_err());
        assert!(Cli::try_parse_from(["llm-cost", "budget", "set", "--limit", "-1"]).is_err());
        let cli = Cli::try_parse_from(["llm-cost", "budget", "set", "--limit", "50"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::Budget {
                cmd: BudgetCmd::Set { limit }
            } if limit == 50.0
        ));
    }

    #[test]
    fn db_flag_skips_config_file() {
        let (dir, ctx) = crate::test_support::temp_context();
        std::fs::write(&ctx.config_path, "{not json").unwrap();
        assert_eq!(ctx.db_path().unwrap(), dir.path().join("usage.db"));
        assert!(ctx.config().is_err());
    }
}
