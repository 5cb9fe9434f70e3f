//! Error types for wall publishing.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::StoreError;

/// Errors that abort a publishing run.
///
/// Every variant is fatal: the run stops at the first one and the current
/// record stays unposted.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Transport-level failure talking to VK or the upload server.
    #[error("network error calling {endpoint}: {source}")]
    Network {
        /// API method name or upload URL.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP {status} from {endpoint}")]
    HttpStatus {
        /// API method name or upload URL.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body does not match the expected shape.
    #[error("malformed response from {endpoint}: {reason}")]
    Decode {
        /// API method name or upload URL.
        endpoint: String,
        /// Decoder message.
        reason: String,
    },

    /// VK returned an error envelope.
    #[error("VK API error {code} in {method}: {message}")]
    Api {
        /// API method name.
        method: String,
        /// VK `error_code`.
        code: i64,
        /// VK `error_msg`.
        message: String,
    },

    /// A media file exceeds the upload size limit.
    #[error("{path} is {size} bytes, over the {limit} byte upload limit")]
    PayloadTooLarge {
        /// The oversized file.
        path: PathBuf,
        /// Its size in bytes.
        size: u64,
        /// The limit in bytes.
        limit: u64,
    },

    /// A media file could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The record store failed while claiming or marking a record.
    #[error("record store error: {0}")]
    Persistence(#[from] StoreError),
}

impl PublishError {
    /// Creates a network error from a reqwest error.
    ///
    /// The request URL is stripped: VK method URLs carry the access token.
    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            source: source.without_url(),
        }
    }

    /// Creates a decode error.
    pub fn decode(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
