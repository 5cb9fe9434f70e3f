//! Record store for downloaded posts.
//!
//! This module provides `SQLite`-backed persistence for [`DownloadRecord`]s:
//! ingestion creates them unposted, the publisher claims the oldest unposted
//! one and flips `posted` once the wall post is live.
//!
//! # Overview
//!
//! - [`RecordStore`] - `SQLite` implementation
//! - [`RecordRepository`] - data-access seam used by the services
//! - [`DownloadRecord`] / [`NewDownloadRecord`] - row and insert shapes
//! - [`StoreError`] - operation error types
//!
//! # Example
//!
//! ```ignore
//! use reposter_core::record::{NewDownloadRecord, RecordStore};
//! use reposter_core::Database;
//!
//! let store = RecordStore::new(Database::new_in_memory().await?);
//! let id = store.create(&NewDownloadRecord::new(paths, "https://example.com/1")).await?;
//! if let Some(record) = store.fetch_oldest_unposted().await? {
//!     // ... publish ...
//!     store.mark_posted(record.id).await?;
//! }
//! ```

mod error;
mod item;
mod repository;

pub use error::{StoreError, StoreErrorKind};
pub use item::{DownloadRecord, NewDownloadRecord};
pub use repository::RecordRepository;

use sqlx::Row;
use tracing::instrument;

use crate::db::Database;
use item::RecordRow;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Returns `Ok(())` if at least one row was affected; otherwise [`StoreError::RecordNotFound`].
fn check_affected(id: i64, rows_affected: u64) -> Result<()> {
    if rows_affected == 0 {
        Err(StoreError::RecordNotFound(id))
    } else {
        Ok(())
    }
}

/// `SQLite`-backed store of download records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    db: Database,
}

impl RecordStore {
    /// Creates a store over the given database handle.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a new unposted record.
    ///
    /// # Returns
    ///
    /// The generated record id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NonUtf8Path`] if a filename is not valid UTF-8,
    /// [`StoreError::Database`] if the insert fails.
    #[instrument(skip(self, record), fields(source = %record.source_url, files = record.filenames.len()))]
    pub async fn create(&self, record: &NewDownloadRecord) -> Result<i64> {
        let filenames = record.filenames_json()?;

        let row = sqlx::query(
            r"INSERT INTO downloaded (filenames, source, posted)
              VALUES (?, ?, 0)
              RETURNING id",
        )
        .bind(filenames)
        .bind(&record.source_url)
        .fetch_one(self.db.pool())
        .await?;

        Ok(row.get("id"))
    }

    /// Returns the unposted record with the lowest id, if any.
    ///
    /// This is a plain read: the row stays unposted until
    /// [`mark_posted`](Self::mark_posted) is called.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails, or
    /// [`StoreError::CorruptRecord`] if the row cannot be decoded.
    #[instrument(skip(self))]
    pub async fn fetch_oldest_unposted(&self) -> Result<Option<DownloadRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r"SELECT id, filenames, source, posted FROM downloaded
              WHERE posted = 0
              ORDER BY id ASC
              LIMIT 1",
        )
        .fetch_optional(self.db.pool())
        .await?;

        row.map(DownloadRecord::try_from).transpose()
    }

    /// Sets `posted = true` for the record. Repeating the call is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordNotFound`] if no record exists with the given id.
    /// Returns [`StoreError::Database`] if the update fails.
    #[instrument(skip(self))]
    pub async fn mark_posted(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            r"UPDATE downloaded
              SET posted = 1, updated_at = datetime('now')
              WHERE id = ?",
        )
        .bind(id)
        .execute(self.db.pool())
        .await?;

        check_affected(id, result.rows_affected())
    }

    /// Gets a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<DownloadRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r"SELECT id, filenames, source, posted FROM downloaded WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(DownloadRecord::try_from).transpose()
    }

    /// Counts records still waiting to be published.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn count_unposted(&self) -> Result<i64> {
        let row = sqlx::query(r"SELECT COUNT(*) AS count FROM downloaded WHERE posted = 0")
            .fetch_one(self.db.pool())
            .await?;

        Ok(row.get("count"))
    }
}
