//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.

#![allow(dead_code)]

mod fake_queue;

pub use fake_queue::FakeJobTable;

use jobqueue_core::client_ledger::SqliteClientLedger;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// A ledger database file in a temporary directory, removed on drop.
pub struct TestLedgerDir {
    dir: TempDir,
}

impl TestLedgerDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("jobs.db")
    }

    /// Open a new, independent connection to the shared file, as a separate
    /// process would.
    pub fn open(&self) -> SqliteClientLedger {
        SqliteClientLedger::with_busy_timeout(self.db_path(), Duration::from_secs(30)).unwrap()
    }
}
