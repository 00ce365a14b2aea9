use clap::Subcommand;
use llmcost_store::{Config, ConfigError, ConfigKey};
use std::io::{self, Write};
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    #[command(after_help = "Keys:
  db_path          SQLite database path
  default_period   today, week, month, or all
  warn_threshold   budget warning percentage (default 80)")]
    Set {
        /// Config key (db_path, default_period, warn_threshold)
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, config_path: &Path) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match cmd {
        ConfigCmd::Set { key, value } => set(&mut out, config_path, &key, &value),
        ConfigCmd::Get { key } => get(&mut out, config_path, &key),
        ConfigCmd::List => list(&mut out, config_path),
    }
}

// ── Command Implementations ──

/// `llm-cost config set <key> <value>`
fn set<W: Write>(out: &mut W, config_path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let key: ConfigKey = key.parse()?;
    let mut config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e @ ConfigError::Parse { .. }) => {
            tracing::warn!(error = %e, "replacing unreadable config file");
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };
    config.set(key, value)?;
    config.save(config_path)?;
    tracing::info!(%key, path = %config_path.display(), "config updated");
    let shown = config.get(key).unwrap_or_default();
    writeln!(out, "{key} = {shown}")?;
    Ok(())
}

/// `llm-cost config get <key>`
fn get<W: Write>(out: &mut W, config_path: &Path, key: &str) -> anyhow::Result<()> {
    let key: ConfigKey = key.parse()?;
    let config = Config::load(config_path)?;
    match config.get(key) {
        Some(v) => writeln!(out, "{v}")?,
        None => writeln!(out, "(not set)")?,
    }
    Ok(())
}

/// `llm-cost config list`
fn list<W: Write>(out: &mut W, config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let entries = config.entries();
    if entries.is_empty() {
        writeln!(out, "(no config set)")?;
        return Ok(());
    }
    for (k, v) in entries {
        writeln!(out, "{k} = {v}")?;
    }
    Ok(())
}
