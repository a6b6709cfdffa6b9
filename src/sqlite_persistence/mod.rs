//! Declarative SQLite schemas with versioning and migrations.

mod versioned_schema;

pub use versioned_schema::{
    open_in_memory_db, open_versioned_db, Column, SqlType, Table, VersionedSchema,
    BASE_DB_VERSION,
};
