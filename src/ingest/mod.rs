//! Ingestion: download each source URL and record it as unposted.
//!
//! Sources are processed in input order. The first failure stops the run;
//! records created before it are kept.

mod error;

pub use error::IngestError;

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::fetch::MediaFetcher;
use crate::record::{NewDownloadRecord, RecordRepository};

/// Default sources file, relative to the working directory.
pub const DEFAULT_SOURCES_PATH: &str = "sources.txt";

/// Totals for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Records written to the store.
    pub records_created: usize,
    /// Media files downloaded across those records.
    pub files_downloaded: usize,
}

/// Turns source URLs into stored [`NewDownloadRecord`]s.
pub struct Ingestor<R, F> {
    records: R,
    fetcher: F,
}

impl<R, F> Ingestor<R, F>
where
    R: RecordRepository,
    F: MediaFetcher,
{
    #[must_use]
    pub fn new(records: R, fetcher: F) -> Self {
        Self { records, fetcher }
    }

    /// Ingests one source URL.
    ///
    /// The record's source is the provider's resolved URL when it reported a
    /// non-empty one, otherwise `source_url` itself.
    ///
    /// # Returns
    ///
    /// The new record id and the number of files downloaded.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Fetch`] or [`IngestError::Persistence`].
    #[instrument(skip(self))]
    pub async fn ingest_source(&self, source_url: &str) -> Result<(i64, usize), IngestError> {
        let media = self
            .fetcher
            .fetch(source_url)
            .await
            .map_err(|e| IngestError::fetch(source_url, e))?;

        let attribution = media.attribution(source_url).to_string();
        let files = media.paths.len();
        let id = self
            .records
            .create(&NewDownloadRecord::new(media.paths, attribution))
            .await?;
        debug!(id, files, "record created");
        Ok((id, files))
    }

    /// Ingests every non-empty line, in order. Lines are used verbatim.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first failing line's error.
    pub async fn ingest_lines<'a, I>(&self, lines: I) -> Result<IngestStats, IngestError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut stats = IngestStats::default();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (_, files) = self.ingest_source(line).await?;
            stats.records_created += 1;
            stats.files_downloaded += files;
        }
        Ok(stats)
    }

    /// Reads `path` and ingests its lines.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] if the file cannot be read, otherwise as
    /// [`ingest_lines`](Self::ingest_lines).
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestStats, IngestError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let stats = self.ingest_lines(content.lines()).await?;
        info!(
            records = stats.records_created,
            files = stats.files_downloaded,
            "ingestion complete"
        );
        Ok(stats)
    }
}
