//! Job data passed through lifecycle hooks.
//!
//! These types belong to the surrounding queue runtime. Hooks receive them by
//! mutable reference so they can inspect and annotate jobs; nothing in this crate
//! persists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const DEFAULT_QUEUE: &str = "default";
pub const DEFAULT_PRIORITY: i16 = 1;
pub const DEFAULT_MAX_ATTEMPTS: i16 = 25;

// =============================================================================
// Job State
// =============================================================================

/// State of a persisted job row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Available,
    Scheduled,
    Running,
    Retryable,
    Completed,
    Cancelled,
    Discarded,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Available => "available",
            JobState::Scheduled => "scheduled",
            JobState::Running => "running",
            JobState::Retryable => "retryable",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
            JobState::Discarded => "discarded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(JobState::Available),
            "scheduled" => Some(JobState::Scheduled),
            "running" => Some(JobState::Running),
            "retryable" => Some(JobState::Retryable),
            "completed" => Some(JobState::Completed),
            "cancelled" => Some(JobState::Cancelled),
            "discarded" => Some(JobState::Discarded),
            _ => None,
        }
    }

    /// Whether the job will never be worked again.
    pub fn is_finalized(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Cancelled | JobState::Discarded
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Insert Parameters
// =============================================================================

/// Parameters of a job that is about to be inserted.
///
/// Insert-begin hooks may rewrite any field, e.g. to inject metadata or tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInsertParams {
    pub kind: String,
    pub args: JsonValue,
    pub queue: String,
    pub priority: i16,
    pub max_attempts: i16,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub metadata: JsonValue,
}

impl JobInsertParams {
    pub fn new(kind: impl Into<String>, args: JsonValue) -> Self {
        Self {
            kind: kind.into(),
            args,
            queue: DEFAULT_QUEUE.to_string(),
            priority: DEFAULT_PRIORITY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            scheduled_at: None,
            tags: Vec::new(),
            metadata: JsonValue::Object(Default::default()),
        }
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    pub fn with_priority(mut self, priority: i16) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_scheduled_at(mut self, scheduled_at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(scheduled_at);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set a single metadata key, turning `metadata` into an object if it isn't one.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: JsonValue) {
        if !self.metadata.is_object() {
            self.metadata = JsonValue::Object(Default::default());
        }
        if let JsonValue::Object(map) = &mut self.metadata {
            map.insert(key.into(), value);
        }
    }
}

// =============================================================================
// Job Row
// =============================================================================

/// A job that has been persisted and claimed by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRow {
    pub id: i64,
    pub kind: String,
    pub args: JsonValue,
    pub queue: String,
    pub state: JobState,
    pub attempt: i16,
    pub max_attempts: i16,
    pub priority: i16,
    pub attempted_at: Option<DateTime<Utc>>,
    /// Client ids of every worker that attempted this job, oldest first.
    pub attempted_by: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub metadata: JsonValue,
}

impl JobRow {
    pub fn metadata_value(&self, key: &str) -> Option<&JsonValue> {
        self.metadata.get(key)
    }
}
