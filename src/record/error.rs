//! Error types for record store operations.

use std::fmt;
use std::path::PathBuf;

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

/// What kind of driver failure a [`StoreError::Database`] wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// `SQLite` returned busy/locked.
    BusyOrLocked,
    /// Unique, check or not-null constraint failed.
    ConstraintViolation,
    PoolTimeout,
    PoolClosed,
    RowNotFound,
    Io,
    Protocol,
    Other,
}

/// Primary result codes `SQLITE_BUSY` and `SQLITE_LOCKED`.
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

impl StoreErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::Io(_) => Self::Io,
            sqlx::Error::Protocol(_) => Self::Protocol,
            sqlx::Error::Database(db) => Self::from_database(db.as_ref()),
            _ => Self::Other,
        }
    }

    fn from_database(db: &dyn DatabaseError) -> Self {
        // Extended result codes keep the primary code in the low byte.
        let primary = db
            .code()
            .and_then(|code| code.parse::<i64>().ok())
            .map(|code| code & 0xff);
        if matches!(primary, Some(SQLITE_BUSY | SQLITE_LOCKED)) {
            return Self::BusyOrLocked;
        }
        match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::CheckViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::ForeignKeyViolation => Self::ConstraintViolation,
            _ => Self::Other,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::ConstraintViolation => "constraint_violation",
            Self::PoolTimeout => "pool_timeout",
            Self::PoolClosed => "pool_closed",
            Self::RowNotFound => "row_not_found",
            Self::Io => "io",
            Self::Protocol => "protocol",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`RecordStore`](super::RecordStore).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("database error ({kind}): {message}")]
    Database {
        kind: StoreErrorKind,
        /// Driver message.
        message: String,
    },

    #[error("download record {0} does not exist")]
    RecordNotFound(i64),

    /// A stored `filenames` value does not decode to a list of paths.
    #[error("download record {id} is corrupt: {reason}")]
    CorruptRecord { id: i64, reason: String },

    /// Filenames are stored as JSON strings, which cannot hold this path.
    #[error("media path {path:?} is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: StoreErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl StoreError {
    #[must_use]
    pub fn corrupt(id: i64, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_message_names_kind() {
        let err = StoreError::Database {
            kind: StoreErrorKind::BusyOrLocked,
            message: "database is locked".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "database error (busy_or_locked): database is locked"
        );
    }

    #[test]
    fn test_record_not_found_message() {
        assert_eq!(
            StoreError::RecordNotFound(42).to_string(),
            "download record 42 does not exist"
        );
    }

    #[test]
    fn test_corrupt_record_message() {
        let msg = StoreError::corrupt(7, "filenames is not a JSON array").to_string();
        assert!(msg.contains('7'));
        assert!(msg.contains("JSON array"));
    }

    #[test]
    fn test_pool_closed_is_classified() {
        let err = StoreError::from(sqlx::Error::PoolClosed);
        assert!(matches!(
            err,
            StoreError::Database {
                kind: StoreErrorKind::PoolClosed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_not_null_violation_is_classified() {
        let db = crate::Database::new_in_memory().await.unwrap();
        let err = sqlx::query("INSERT INTO downloaded (filenames, source) VALUES ('[]', NULL)")
            .execute(db.pool())
            .await
            .unwrap_err();

        assert_eq!(
            StoreErrorKind::from_sqlx(&err),
            StoreErrorKind::ConstraintViolation
        );
    }
}
