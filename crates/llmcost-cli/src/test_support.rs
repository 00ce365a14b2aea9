use crate::Context;
use llmcost_core::PriceTable;

/// A context whose database and config live in a fresh temp dir.
pub fn temp_context() -> (tempfile::TempDir, Context) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Context {
        config_path: dir.path().join("config.json"),
        prices: PriceTable::builtin(),
        db_flag: Some(dir.path().join("usage.db")),
    };
    (dir, ctx)
}

/// Disable ANSI colors so rendered output can be compared as plain text.
pub fn plain() {
    colored::control::set_override(false);
}
