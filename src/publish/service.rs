//! The publishing loop.

use std::time::Duration;

use tracing::{debug, info, instrument};

use super::client::check_upload_size;
use super::{PublishError, WallClient, WallPost};
use crate::record::{DownloadRecord, RecordRepository};

/// Pause after each published record. The only rate control against VK.
pub const POST_DELAY: Duration = Duration::from_secs(1);

/// Totals for one [`Publisher::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Records published and marked posted.
    pub records_posted: usize,
    /// Photos uploaded and registered across those records.
    pub attachments_uploaded: usize,
}

/// Drains unposted records onto the community wall, oldest first.
///
/// Records are processed strictly one at a time: every file of a record is
/// uploaded and registered in order, the post is published, and the record is
/// marked posted before the next claim. The first error ends the run and
/// leaves the current record unposted. Uploads that succeeded before the
/// error are not removed from VK.
///
/// Claiming and marking are separate store calls. A crash after `wall.post`
/// succeeds but before the mark lands republishes the record on the next run.
pub struct Publisher<R, C> {
    records: R,
    client: C,
}

impl<R, C> Publisher<R, C>
where
    R: RecordRepository,
    C: WallClient,
{
    #[must_use]
    pub fn new(records: R, client: C) -> Self {
        Self { records, client }
    }

    /// Publishes until no unposted record remains.
    ///
    /// # Errors
    ///
    /// Returns the first [`PublishError`] raised by the store, the size
    /// check, or any remote step.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<PublishStats, PublishError> {
        let mut stats = PublishStats::default();

        while let Some(attachments) = self.publish_next().await? {
            stats.records_posted += 1;
            stats.attachments_uploaded += attachments;
            tokio::time::sleep(POST_DELAY).await;
        }

        info!(
            records = stats.records_posted,
            attachments = stats.attachments_uploaded,
            "no unposted records left"
        );
        Ok(stats)
    }

    /// Publishes the oldest unposted record.
    ///
    /// # Returns
    ///
    /// `Some(attachment count)` when a record was posted, `None` when the
    /// store holds no unposted record.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub async fn publish_next(&self) -> Result<Option<usize>, PublishError> {
        let Some(record) = self.records.fetch_oldest_unposted().await? else {
            return Ok(None);
        };
        let attachments = self.publish_record(&record).await?;
        self.records.mark_posted(record.id).await?;
        info!(id = record.id, source = %record.source_url, attachments, "record posted");
        Ok(Some(attachments))
    }

    #[instrument(skip(self, record), fields(id = record.id, files = record.filenames.len()))]
    async fn publish_record(&self, record: &DownloadRecord) -> Result<usize, PublishError> {
        // Reject oversized or missing files before touching VK.
        for path in &record.filenames {
            check_upload_size(path).await?;
        }

        let mut attachments = Vec::with_capacity(record.filenames.len());
        for path in &record.filenames {
            let target = self.client.request_upload_target().await?;
            let token = self.client.upload_binary(&target, path).await?;
            let photo = self.client.register_media(&token).await?;
            debug!(path = %path.display(), attachment = %photo, "photo ready");
            attachments.push(photo.attachment());
        }

        let post = WallPost {
            attachments,
            copyright: record.source_url.clone(),
        };
        self.client.publish_post(&post).await?;
        Ok(post.attachments.len())
    }
}
