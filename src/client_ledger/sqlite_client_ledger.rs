use super::clock::{Clock, SystemClock};
use super::models::{ClientRecord, ClientUpsertParams};
use super::schema::CLIENT_LEDGER_VERSIONED_SCHEMAS;
use super::ClientLedgerStore;
use crate::error::{QueueError, QueueResult};
use crate::sqlite_persistence::{open_in_memory_db, open_versioned_db};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

const UPSERT_SQL: &str = "INSERT INTO client_ledger (id, created_at, metadata, paused_at, updated_at)
     VALUES (?1, ?2, coalesce(?3, '{}'), ?4, coalesce(?5, ?2))
     ON CONFLICT(id) DO UPDATE SET
         paused_at = CASE WHEN ?6 THEN ?4 ELSE client_ledger.paused_at END,
         updated_at = max(client_ledger.updated_at, coalesce(?5, ?2))
     RETURNING id, created_at, metadata, paused_at, updated_at";

const SELECT_COLUMNS: &str = "SELECT id, created_at, metadata, paused_at, updated_at FROM client_ledger";

/// SQLite-backed client ledger.
///
/// Every process sharing the database file opens its own instance. Upserts run
/// in an immediate transaction so writers queue on SQLite's write lock (bounded
/// by the busy timeout) instead of interleaving.
pub struct SqliteClientLedger {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl SqliteClientLedger {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::with_busy_timeout(db_path, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn with_busy_timeout<P: AsRef<Path>>(db_path: P, busy_timeout: Duration) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = open_versioned_db(
            path,
            CLIENT_LEDGER_VERSIONED_SCHEMAS,
            "client ledger",
            busy_timeout,
        )?;
        info!(
            "Opened client ledger at {:?} (busy_timeout={:?})",
            path, busy_timeout
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: Arc::new(SystemClock),
        })
    }

    /// Create an in-memory ledger. Only visible to this instance.
    pub fn in_memory() -> Result<Self> {
        let conn = open_in_memory_db(CLIENT_LEDGER_VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for "now" defaults.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> QueueResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| QueueError::StorageUnavailable {
            source: anyhow::anyhow!("client ledger connection lock poisoned"),
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ClientRecord> {
        let metadata_str: String = row.get("metadata")?;
        let metadata = serde_json::from_str(&metadata_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        Ok(ClientRecord {
            id: row.get("id")?,
            metadata,
            paused_at: row
                .get::<_, Option<i64>>("paused_at")?
                .map(|micros| from_micros(micros, 3))
                .transpose()?,
            created_at: from_micros(row.get("created_at")?, 1)?,
            updated_at: from_micros(row.get("updated_at")?, 4)?,
        })
    }
}

fn from_micros(micros: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Integer,
            format!("timestamp {} out of range", micros).into(),
        )
    })
}

impl ClientLedgerStore for SqliteClientLedger {
    fn upsert(&self, input: ClientUpsertParams) -> QueueResult<ClientRecord> {
        input.validate()?;

        let now = self.clock.now().timestamp_micros();
        let metadata = input
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| QueueError::invalid_argument(format!("unserializable metadata: {e}")))?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let record = tx.query_row(
            UPSERT_SQL,
            params![
                input.id,
                now,
                metadata,
                input.paused_at.value().map(|t| t.timestamp_micros()),
                input.updated_at.map(|t| t.timestamp_micros()),
                input.paused_at.is_specified(),
            ],
            Self::row_to_record,
        )?;
        tx.commit()?;

        debug!(
            "Upserted client '{}' (paused={}, updated_at={})",
            record.id,
            record.is_paused(),
            record.updated_at
        );
        Ok(record)
    }

    fn get(&self, id: &str) -> QueueResult<Option<ClientRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list(&self) -> QueueResult<Vec<ClientRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn list_updated_before(&self, cutoff: DateTime<Utc>) -> QueueResult<Vec<ClientRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE updated_at < ?1 ORDER BY updated_at ASC, id ASC",
            SELECT_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![cutoff.timestamp_micros()], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}
