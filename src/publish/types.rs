//! Wire types of the VK wall upload protocol.

use std::fmt;

use serde::Deserialize;

/// Every VK method answers with either `response` or `error`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) response: Option<T>,
    pub(crate) error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub(crate) error_code: i64,
    #[serde(default)]
    pub(crate) error_msg: String,
}

/// Result of `photos.getWallUploadServer`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadTarget {
    /// One-shot URL to POST the file to.
    pub upload_url: String,
}

/// What the upload server returns for a stored file.
///
/// Passed back verbatim to `photos.saveWallPhoto`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadToken {
    pub server: i64,
    pub photo: String,
    pub hash: String,
}

/// A photo registered on the community wall album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SavedPhoto {
    pub id: i64,
    pub owner_id: i64,
}

impl SavedPhoto {
    /// Attachment token for `wall.post`, e.g. `photo-10_457239017`.
    #[must_use]
    pub fn attachment(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SavedPhoto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "photo{}_{}", self.owner_id, self.id)
    }
}

/// Result of `wall.post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PostReceipt {
    pub post_id: i64,
}

/// A wall post ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallPost {
    /// Attachment tokens in display order.
    pub attachments: Vec<String>,
    /// Attribution URL sent as `copyright`.
    pub copyright: String,
}

impl WallPost {
    /// The `attachments` parameter value.
    #[must_use]
    pub fn attachments_param(&self) -> String {
        self.attachments.join(",")
    }
}
