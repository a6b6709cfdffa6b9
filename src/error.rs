//! Error types shared by the hook pipeline and the client ledger.

use crate::hooks::HookCapability;
use thiserror::Error;

/// Errors surfaced by the lifecycle dispatcher and the client ledger.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Caller passed a malformed argument. Never reaches storage.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A hook returned an error, aborting the guarded operation.
    #[error("Hook '{hook}' rejected {point}: {source}")]
    HookRejected {
        point: HookCapability,
        hook: String,
        #[source]
        source: anyhow::Error,
    },

    /// Transient storage failure, safe to retry.
    #[error("Storage unavailable: {source}")]
    StorageUnavailable {
        #[source]
        source: anyhow::Error,
    },

    /// A stored row could not be decoded. Retrying reads the same bytes.
    #[error("Corrupt stored data: {source}")]
    DataCorruption {
        #[source]
        source: anyhow::Error,
    },

    /// The context was cancelled or its deadline passed.
    #[error("Cancelled during {}", describe_point(.point))]
    Cancelled { point: Option<HookCapability> },
}

impl QueueError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        QueueError::InvalidArgument(msg.into())
    }

    /// Whether retrying the same operation later may succeed.
    ///
    /// Explicit hook rejections, invalid arguments and corrupt rows are not
    /// retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueueError::StorageUnavailable { .. } | QueueError::Cancelled { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueueError::Cancelled { .. })
    }
}

impl From<rusqlite::Error> for QueueError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        let corrupt = match &err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => true,
            rusqlite::Error::SqliteFailure(failure, _) => matches!(
                failure.code,
                ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase
            ),
            _ => false,
        };
        if corrupt {
            QueueError::DataCorruption { source: err.into() }
        } else {
            QueueError::StorageUnavailable { source: err.into() }
        }
    }
}

fn describe_point(point: &Option<HookCapability>) -> String {
    match point {
        Some(point) => point.to_string(),
        None => "storage call".to_string(),
    }
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Marker error a hook returns when it gives up because its context was cancelled.
///
/// The dispatcher recognizes it and reports [`QueueError::Cancelled`] instead of a
/// rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(QueueError::Cancelled { point: None }.is_retryable());
        assert!(QueueError::StorageUnavailable {
            source: anyhow::anyhow!("disk I/O error")
        }
        .is_retryable());
        assert!(!QueueError::invalid_argument("empty id").is_retryable());
        assert!(!QueueError::HookRejected {
            point: HookCapability::InsertBegin,
            hook: "guard".to_string(),
            source: anyhow::anyhow!("nope"),
        }
        .is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let rejected = QueueError::HookRejected {
            point: HookCapability::WorkBegin,
            hook: "guard".to_string(),
            source: anyhow::anyhow!("queue is blocked"),
        };
        assert_eq!(
            rejected.to_string(),
            "Hook 'guard' rejected work_begin: queue is blocked"
        );

        let cancelled = QueueError::Cancelled {
            point: Some(HookCapability::InsertBegin),
        };
        assert_eq!(cancelled.to_string(), "Cancelled during insert_begin");
        assert_eq!(
            QueueError::Cancelled { point: None }.to_string(),
            "Cancelled during storage call"
        );
    }

    #[test]
    fn test_rusqlite_errors_are_storage_unavailable() {
        let err: QueueError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, QueueError::StorageUnavailable { .. }));

        let busy: QueueError = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        )
        .into();
        assert!(matches!(busy, QueueError::StorageUnavailable { .. }));
        assert!(busy.is_retryable());
    }

    #[test]
    fn test_undecodable_rows_are_not_retryable() {
        let err: QueueError = rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            "expected a JSON object".into(),
        )
        .into();
        assert!(matches!(err, QueueError::DataCorruption { .. }));
        assert!(!err.is_retryable());

        let not_a_db: QueueError = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_NOTADB),
            None,
        )
        .into();
        assert!(matches!(not_a_db, QueueError::DataCorruption { .. }));
    }
}
