//! Error types for media fetching.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving and downloading a source's media.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source string is not a valid absolute URL.
    #[error("invalid source URL: {url}")]
    InvalidUrl {
        /// The rejected input.
        url: String,
    },

    /// The source resolves to no media (unknown host, deleted post, no photos).
    #[error("no media found for {url}: {reason}")]
    NotFound {
        /// The source or API URL that produced nothing.
        url: String,
        /// Why nothing was found.
        reason: String,
    },

    /// The provider answered HTTP 429.
    #[error("rate limited by {url} (retry after: {retry_after:?})")]
    RateLimited {
        /// The throttled URL.
        url: String,
        /// Raw Retry-After header value, if sent.
        retry_after: Option<String>,
    },

    /// Transport-level failure (DNS, connect, TLS, timeout, broken body).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL being fetched.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provider API returned a body that does not match the expected shape.
    #[error("malformed response from {url}: {reason}")]
    Decode {
        /// The API URL.
        url: String,
        /// Decoder message.
        reason: String,
    },

    /// Writing the media file failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a not-found error.
    pub fn not_found(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotFound {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a network error from a reqwest error.
    ///
    /// The reqwest error's own copy of the URL is dropped; callers pass an
    /// already redacted `url`.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source: source.without_url(),
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
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

    /// Maps a non-success HTTP status to the matching variant.
    pub fn from_status(url: impl Into<String>, status: u16, retry_after: Option<String>) -> Self {
        let url = url.into();
        match status {
            429 => Self::RateLimited { url, retry_after },
            404 | 410 => Self::NotFound {
                url,
                reason: format!("HTTP {status}"),
            },
            _ => Self::HttpStatus { url, status },
        }
    }
}
