//! Error types for ingestion.

use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;
use crate::record::StoreError;

/// Errors that stop an ingestion run. The run is fail-fast: the first one wins.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Downloading a source failed.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        /// The input line being processed.
        url: String,
        /// The fetcher's error.
        #[source]
        source: FetchError,
    },

    /// Saving the record failed.
    #[error("record store error: {0}")]
    Persistence(#[from] StoreError),

    /// The sources file could not be read.
    #[error("cannot read sources file {path}: {source}")]
    Io {
        /// The sources file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    /// Creates a fetch error for `url`.
    pub fn fetch(url: impl Into<String>, source: FetchError) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }
}
