use crate::error::{QueueError, QueueResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Longest accepted client id, in bytes.
pub const MAX_CLIENT_ID_LEN: usize = 255;

/// Presence row for one named client (a worker process or process group).
///
/// Timestamps are stored with microsecond precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
    /// Arbitrary client-supplied JSON object.
    pub metadata: JsonValue,
    /// Set while the client is paused.
    pub paused_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Last heartbeat.
    pub updated_at: DateTime<Utc>,
}

impl ClientRecord {
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }
}

/// What an upsert should do with the pause state.
///
/// Keeps "leave it alone" distinct from "explicitly unpause".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseUpdate {
    /// Keep whatever is stored. New rows start unpaused.
    #[default]
    Unchanged,
    /// Unpause.
    Clear,
    /// Pause as of the given time.
    Set(DateTime<Utc>),
}

impl PauseUpdate {
    /// Whether the upsert should overwrite the stored pause state.
    pub fn is_specified(&self) -> bool {
        !matches!(self, PauseUpdate::Unchanged)
    }

    /// The value to write when the pause state is overwritten (or a row created).
    pub fn value(&self) -> Option<DateTime<Utc>> {
        match self {
            PauseUpdate::Set(at) => Some(*at),
            PauseUpdate::Unchanged | PauseUpdate::Clear => None,
        }
    }
}

/// Input of [`super::ClientLedgerStore::upsert`].
///
/// `None`/[`PauseUpdate::Unchanged`] fields take defaults on insert and keep the
/// stored value on conflict. `metadata` is only applied when the row is created.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientUpsertParams {
    pub id: String,
    pub metadata: Option<JsonValue>,
    pub paused_at: PauseUpdate,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ClientUpsertParams {
    /// A bare heartbeat for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: None,
            paused_at: PauseUpdate::Unchanged,
            updated_at: None,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn pause_at(mut self, at: DateTime<Utc>) -> Self {
        self.paused_at = PauseUpdate::Set(at);
        self
    }

    pub fn unpause(mut self) -> Self {
        self.paused_at = PauseUpdate::Clear;
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Reject inputs that must never reach storage.
    pub fn validate(&self) -> QueueResult<()> {
        if self.id.trim().is_empty() {
            return Err(QueueError::invalid_argument("client id must not be empty"));
        }
        if self.id.len() > MAX_CLIENT_ID_LEN {
            return Err(QueueError::invalid_argument(format!(
                "client id is {} bytes long, max is {}",
                self.id.len(),
                MAX_CLIENT_ID_LEN
            )));
        }
        if let Some(metadata) = &self.metadata {
            if !metadata.is_object() {
                return Err(QueueError::invalid_argument(
                    "client metadata must be a JSON object",
                ));
            }
        }
        Ok(())
    }
}
