//! Job queue core: lifecycle hooks and the client presence ledger.
//!
//! This library exposes the hook capability contracts, the dispatcher that runs
//! them at job insertion and work start, and the SQLite-backed ledger every
//! worker process heartbeats into.

pub mod client_ledger;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod hooks;
pub mod job;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use client_ledger::{
    ClientLedgerStore, ClientRecord, ClientUpsertParams, PauseUpdate, SqliteClientLedger,
};
pub use error::{QueueError, QueueResult};
pub use heartbeat::{ClientHeartbeat, HeartbeatHandle, HeartbeatSettings};
pub use hooks::{
    Hook, HookCapability, HookContext, HookInsertBegin, HookInsertBeginFunc, HookRegistry,
    HookWorkBegin, HookWorkBeginFunc, LifecycleDispatcher,
};
pub use job::{JobInsertParams, JobRow, JobState};
