//! Repository seam for record persistence.
//!
//! The ingestion and publishing services depend on this trait rather than on
//! [`RecordStore`] directly, so either can run against any store.

use async_trait::async_trait;

use super::{DownloadRecord, NewDownloadRecord, RecordStore, Result};

/// Data-access contract consumed by the services.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Persists a new unposted record and returns its id.
    async fn create(&self, record: &NewDownloadRecord) -> Result<i64>;

    /// Returns the unposted record with the lowest id, or `None` when drained.
    async fn fetch_oldest_unposted(&self) -> Result<Option<DownloadRecord>>;

    /// Marks a record posted. Idempotent.
    async fn mark_posted(&self, id: i64) -> Result<()>;
}

#[async_trait]
impl RecordRepository for RecordStore {
    async fn create(&self, record: &NewDownloadRecord) -> Result<i64> {
        RecordStore::create(self, record).await
    }

    async fn fetch_oldest_unposted(&self) -> Result<Option<DownloadRecord>> {
        RecordStore::fetch_oldest_unposted(self).await
    }

    async fn mark_posted(&self, id: i64) -> Result<()> {
        RecordStore::mark_posted(self, id).await
    }
}
