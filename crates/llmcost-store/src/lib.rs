pub mod config;

pub use config::{Config, ConfigError, ConfigKey};

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the database location.
pub const DB_ENV: &str = "LLM_COST_DB";

/// Return the per-user config root: `<config_dir>/llm-cost/`
/// (falls back to `~/.llm-cost/`).
pub fn store_root() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("llm-cost")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".llm-cost")
    } else {
        PathBuf::from(".llm-cost")
    }
}

/// Return the config file path: `store_root/config.json`
pub fn config_path() -> PathBuf {
    store_root().join("config.json")
}

/// Default database file: `~/.llm-cost.db`
pub fn default_db_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".llm-cost.db"),
        None => PathBuf::from(".llm-cost.db"),
    }
}

/// Pick the database path: `--db` flag, then `LLM_COST_DB`, then the
/// config file's `db_path`, then the default.
pub fn resolve_db_path(flag: Option<&Path>, env: Option<OsString>, config: &Config) -> PathBuf {
    if let Some(p) = flag {
        return p.to_path_buf();
    }
    if let Some(v) = env.filter(|v| !v.is_empty()) {
        return PathBuf::from(v);
    }
    if let Some(p) = &config.db_path {
        return p.clone();
    }
    default_db_path()
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no parent dir for {}", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
