//! Download record types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::StoreError;

/// One ingested source and the media files downloaded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    /// Store-assigned identifier; claim order is ascending id.
    pub id: i64,
    /// Local media paths in the order they will be attached to the post.
    pub filenames: Vec<PathBuf>,
    /// URL the media was found at, used as the post's attribution.
    pub source_url: String,
    /// Set once the record has been published.
    pub posted: bool,
}

/// Insert shape for a new record. `posted` always starts false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDownloadRecord {
    /// Local media paths, in attachment order.
    pub filenames: Vec<PathBuf>,
    /// Attribution URL.
    pub source_url: String,
}

impl NewDownloadRecord {
    #[must_use]
    pub fn new(filenames: Vec<PathBuf>, source_url: impl Into<String>) -> Self {
        Self {
            filenames,
            source_url: source_url.into(),
        }
    }

    /// Serializes the file list into the JSON array stored in the `filenames` column.
    ///
    /// # Errors
    ///
    /// [`StoreError::NonUtf8Path`] for a path that has no exact string form.
    pub(crate) fn filenames_json(&self) -> Result<String, StoreError> {
        let names = self
            .filenames
            .iter()
            .map(|path| {
                path.to_str()
                    .map(serde_json::Value::from)
                    .ok_or_else(|| StoreError::NonUtf8Path { path: path.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(serde_json::Value::Array(names).to_string())
    }
}

/// Raw `downloaded` row as stored in SQLite.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct RecordRow {
    pub id: i64,
    pub filenames: String,
    pub source: String,
    pub posted: bool,
}

impl TryFrom<RecordRow> for DownloadRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let names: Vec<String> = serde_json::from_str(&row.filenames)
            .map_err(|e| StoreError::corrupt(row.id, format!("filenames: {e}")))?;
        Ok(Self {
            id: row.id,
            filenames: names.into_iter().map(PathBuf::from).collect(),
            source_url: row.source,
            posted: row.posted,
        })
    }
}
