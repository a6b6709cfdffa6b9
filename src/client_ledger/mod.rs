//! Client presence ledger.
//!
//! Each worker process (or process group) sharing a job database keeps one row
//! here, refreshed by heartbeat. The row carries the client's pause state, which
//! other processes use for pause/resume control and stale-worker detection.

mod clock;
mod models;
mod schema;
mod sqlite_client_ledger;

pub use clock::{Clock, ManualClock, SystemClock};
pub use models::*;
pub use schema::CLIENT_LEDGER_VERSIONED_SCHEMAS;
pub use sqlite_client_ledger::{SqliteClientLedger, DEFAULT_BUSY_TIMEOUT};

use crate::error::QueueResult;
use chrono::{DateTime, Utc};

/// Storage for client presence rows.
///
/// Implementations are blocking; call them from `spawn_blocking` inside async
/// code.
pub trait ClientLedgerStore: Send + Sync {
    /// Atomically create or refresh the row for `params.id` and return the
    /// resulting row.
    ///
    /// On insert, absent fields take defaults (`{}` metadata, unpaused, now).
    /// On conflict, `updated_at` advances to the supplied time or now (never
    /// backwards), the pause state changes only if explicitly requested, and
    /// metadata is left as it was.
    fn upsert(&self, params: ClientUpsertParams) -> QueueResult<ClientRecord>;

    fn get(&self, id: &str) -> QueueResult<Option<ClientRecord>>;

    /// All rows ordered by id.
    fn list(&self) -> QueueResult<Vec<ClientRecord>>;

    /// Rows whose last heartbeat is older than `cutoff`, oldest first.
    fn list_updated_before(&self, cutoff: DateTime<Utc>) -> QueueResult<Vec<ClientRecord>>;

    /// Whether `id` exists and is paused.
    fn is_paused(&self, id: &str) -> QueueResult<bool> {
        Ok(self.get(id)?.is_some_and(|record| record.is_paused()))
    }
}
