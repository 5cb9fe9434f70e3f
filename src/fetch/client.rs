//! HTTP client used by media providers.
//!
//! Wraps a `reqwest::Client` with the two operations every provider needs:
//! reading a JSON metadata document and streaming a media file to disk.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::FetchError;
use crate::http_client;

/// Shared client for provider API calls and media downloads.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
}

impl FetchClient {
    /// Creates a client with the project's default timeouts.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest::Error` raised while building the client.
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http_client::build_http_client()?,
        })
    }

    /// GETs `url` and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] on transport failure, the status mapping
    /// of [`FetchError::from_status`] on non-success codes, and
    /// [`FetchError::Decode`] when the body does not match `T`.
    #[instrument(skip(self, url), fields(url = %redact_url(url)))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let response = self.send(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(redact_url(url), e))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::decode(redact_url(url), e.to_string()))
    }

    /// Streams `url` into `dest`, creating the parent directory when absent.
    ///
    /// An existing file at `dest` is overwritten. A partially written file is
    /// removed when the transfer fails.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] for filesystem failures and the same
    /// network/status errors as [`get_json`](Self::get_json).
    #[instrument(skip(self, url, dest), fields(url = %redact_url(url), dest = %dest.display()))]
    pub async fn download_to_path(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
        }

        let response = self.send(url).await?;

        let file = File::create(dest)
            .await
            .map_err(|e| FetchError::io(dest, e))?;

        let result = stream_to_file(file, response, url, dest).await;
        if result.is_err() {
            debug!("cleaning up partial file after error");
            let _ = tokio::fs::remove_file(dest).await;
        }
        let bytes = result?;

        debug!(bytes, "media saved");
        Ok(bytes)
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::network(redact_url(url), e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            return Err(FetchError::from_status(
                redact_url(url),
                status.as_u16(),
                retry_after,
            ));
        }

        Ok(response)
    }
}

async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &Url,
    dest: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::network(redact_url(url), e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(dest, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| FetchError::io(dest, e))?;
    Ok(bytes_written)
}

/// Query parameters that carry provider credentials.
const SECRET_QUERY_KEYS: &[&str] = &["api_key", "user_id", "access_token"];

fn is_secret(key: &str) -> bool {
    SECRET_QUERY_KEYS.contains(&key)
}

/// `url` as text with credential query values masked, for errors and logs.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| is_secret(&key)) {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if is_secret(&key) {
                "[REDACTED]".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

/// File extension of the last path segment of a media URL, lowercased.
///
/// Falls back to `jpg` when the URL has none.
#[must_use]
pub fn extension_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "jpg".to_string(), str::to_ascii_lowercase)
}
