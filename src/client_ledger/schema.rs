//! SQLite schema definitions for the client ledger database.

use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Client presence
// =============================================================================

/// One row per client id. Timestamps are unix microseconds (UTC).
const CLIENT_LEDGER_TABLE_V1: Table = Table {
    name: "client_ledger",
    columns: &[
        sqlite_column!(
            "id",
            SqlType::Text,
            is_primary_key = true,
            non_null = true
        ),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
        sqlite_column!(
            "metadata",
            SqlType::Text,
            non_null = true,
            default_value = Some("'{}'")
        ),
        sqlite_column!("paused_at", SqlType::Integer),
        sqlite_column!("updated_at", SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_client_ledger_updated_at", "updated_at")],
};

pub static CLIENT_LEDGER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[CLIENT_LEDGER_TABLE_V1],
    migration: None,
}];
