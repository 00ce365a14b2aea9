//! SQLite-backed usage ledger.
//!
//! One `usage` row per recorded API request (append-only) plus a singleton
//! `budget` row. Timestamps are stored as RFC 3339 UTC strings at second
//! precision so that lexical order matches chronological order.

use crate::error::{LedgerError, Result};
use llmcost_core::{NewUsage, UsageFilter, UsageRecord};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime, UtcOffset};

const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS usage (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    provider TEXT NOT NULL,
    model TEXT NOT NULL,
    input_tokens INTEGER NOT NULL,
    output_tokens INTEGER NOT NULL,
    cached_tokens INTEGER NOT NULL DEFAULT 0,
    cost REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS budget (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    monthly_limit REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_usage_timestamp ON usage(timestamp);
CREATE INDEX IF NOT EXISTS idx_usage_provider ON usage(provider);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const SELECT_USAGE: &str = "SELECT id, timestamp, provider, model, input_tokens, output_tokens, \
                            cached_tokens, cost FROM usage WHERE 1=1";

/// Handle on the usage database. Closed (and the WAL checkpointed) on drop.
pub struct UsageStore {
    conn: Connection,
    path: PathBuf,
}

impl UsageStore {
    /// Open or create the database at `db_path` with full schema.
    /// Safe to call on every process start.
    pub fn open_or_create(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LedgerError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(db_path).map_err(|source| LedgerError::Open {
            path: db_path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn,
            path: db_path.to_path_buf(),
        };
        store.apply_pragmas()?;
        store.apply_schema()?;
        tracing::debug!(path = %store.path.display(), "usage store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn apply_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn apply_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;
        match self.schema_version()? {
            Some(found) if found > SCHEMA_VERSION => Err(LedgerError::UnsupportedSchema {
                path: self.path.clone(),
                found,
                supported: SCHEMA_VERSION,
            }),
            _ => Ok(()),
        }
    }

    /// Version recorded in `schema_meta`, if any.
    pub fn schema_version(&self) -> Result<Option<u32>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    // ── Usage ───────────────────────────────────────────────────────

    /// Append one usage row and return its id. No validation of token
    /// counts is performed.
    pub fn record_usage(&self, entry: &NewUsage) -> Result<i64> {
        let ts = format_timestamp(entry.timestamp)?;
        self.conn.execute(
            "INSERT INTO usage (timestamp, provider, model, input_tokens, output_tokens, \
             cached_tokens, cost) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                ts,
                entry.provider,
                entry.model,
                to_sql_int(entry.tokens.input)?,
                to_sql_int(entry.tokens.output)?,
                to_sql_int(entry.tokens.cached)?,
                entry.cost,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(
            id,
            provider = %entry.provider,
            model = %entry.model,
            input_tokens = entry.tokens.input,
            output_tokens = entry.tokens.output,
            cached_tokens = entry.tokens.cached,
            cost = entry.cost,
            "usage recorded"
        );
        Ok(id)
    }

    /// Rows matching every set field of `filter`, newest first.
    pub fn query_usage(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>> {
        let mut sql = String::from(SELECT_USAGE);
        let mut args: Vec<String> = Vec::new();

        if let Some(since) = filter.since {
            args.push(format_timestamp(since)?);
            sql.push_str(&format!(" AND timestamp >= ?{}", args.len()));
        }
        if let Some(provider) = &filter.provider {
            args.push(provider.clone());
            sql.push_str(&format!(" AND provider = ?{}", args.len()));
        }
        if let Some(model) = &filter.model {
            args.push(model.clone());
            sql.push_str(&format!(" AND model = ?{}", args.len()));
        }
        sql.push_str(" ORDER BY timestamp DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), map_usage_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let records: Vec<UsageRecord> = rows.into_iter().map(row_to_record).collect();
        tracing::debug!(rows = records.len(), ?filter, "usage query");
        Ok(records)
    }

    // ── Budget ──────────────────────────────────────────────────────

    /// Upsert the singleton monthly budget.
    pub fn set_budget(&self, monthly_limit: f64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO budget (id, monthly_limit) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET monthly_limit = excluded.monthly_limit",
            params![monthly_limit],
        )?;
        tracing::info!(monthly_limit, "budget set");
        Ok(())
    }

    /// The configured monthly budget, or `None` if never set.
    pub fn get_budget(&self) -> Result<Option<f64>> {
        let limit = self
            .conn
            .query_row("SELECT monthly_limit FROM budget WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(limit)
    }
}

impl Drop for UsageStore {
    fn drop(&mut self) {
        // Merge WAL back into main DB so users see a single file when idle.
        let _ = self
            .conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);");
    }
}

// ── Internal helpers ────────────────────────────────────────────────

/// Intermediate row struct for decoding.
struct UsageRow {
    id: i64,
    timestamp: String,
    provider: String,
    model: String,
    input_tokens: i64,
    output_tokens: i64,
    cached_tokens: i64,
    cost: f64,
}

fn map_usage_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UsageRow> {
    Ok(UsageRow {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        provider: row.get(2)?,
        model: row.get(3)?,
        input_tokens: row.get(4)?,
        output_tokens: row.get(5)?,
        cached_tokens: row.get(6)?,
        cost: row.get(7)?,
    })
}

fn row_to_record(row: UsageRow) -> UsageRecord {
    let timestamp = OffsetDateTime::parse(&row.timestamp, &Rfc3339).unwrap_or_else(|_| {
        tracing::warn!(
            id = row.id,
            timestamp = %row.timestamp,
            "unparseable timestamp; using epoch"
        );
        OffsetDateTime::UNIX_EPOCH
    });
    UsageRecord {
        id: row.id,
        timestamp,
        input_tokens: from_sql_int(row.id, row.input_tokens),
        output_tokens: from_sql_int(row.id, row.output_tokens),
        cached_tokens: from_sql_int(row.id, row.cached_tokens),
        provider: row.provider,
        model: row.model,
        cost: row.cost,
    }
}

/// RFC 3339 in UTC, truncated to whole seconds.
fn format_timestamp(ts: OffsetDateTime) -> Result<String> {
    let ts = ts.to_offset(UtcOffset::UTC);
    let ts = ts - Duration::nanoseconds(i64::from(ts.nanosecond()));
    Ok(ts.format(&Rfc3339)?)
}

fn to_sql_int(v: u64) -> Result<i64> {
    i64::try_from(v).map_err(|_| LedgerError::TokenOverflow(v))
}

/// Rows written by older tools may hold negative counts; read those as zero.
fn from_sql_int(id: i64, v: i64) -> u64 {
    u64::try_from(v).unwrap_or_else(|_| {
        tracing::warn!(id, value = v, "negative token count; reading as 0");
        0
    })
}
