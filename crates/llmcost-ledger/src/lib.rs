pub mod error;
pub mod sqlite_store;

pub use error::{LedgerError, Result};
pub use sqlite_store::UsageStore;
