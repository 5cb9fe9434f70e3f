//! Media fetching: turn a source URL into downloaded local files.
//!
//! # Architecture
//!
//! - [`MediaFetcher`] - What the ingestion service consumes: URL in, files out
//! - [`MediaProvider`] - One implementation per supported site
//! - [`ProviderRegistry`] - Host-keyed dispatch table; implements [`MediaFetcher`]
//! - [`GelbooruProvider`] - `gelbooru.com` post pages via the DAPI
//! - [`TwitterProvider`] - `twitter.com` / `x.com` status photos
//! - [`FetchClient`] - Shared HTTP plumbing for providers
//!
//! # Example
//!
//! ```no_run
//! use reposter_core::fetch::{FetchClient, MediaFetcher, build_default_registry};
//! use reposter_core::config::SourcesConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_registry(FetchClient::new()?, &SourcesConfig::default())?;
//! let media = registry.fetch("https://twitter.com/someone/status/1").await?;
//! println!("{} files", media.paths.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod gelbooru;
mod registry;
mod twitter;

pub use client::{FetchClient, extension_from_url, redact_url};
pub use error::FetchError;
pub use gelbooru::{DEFAULT_GELBOORU_API_URL, GelbooruProvider};
pub use registry::ProviderRegistry;
pub use twitter::{DEFAULT_TWITTER_API_URL, TwitterProvider};

use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

use crate::config::SourcesConfig;

/// Files downloaded for one source, plus the provider's canonical source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    /// Local paths in the provider's media order.
    pub paths: Vec<PathBuf>,
    /// Canonical source reported by the provider, when it knows one.
    pub resolved_source: Option<String>,
}

impl FetchedMedia {
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            resolved_source: None,
        }
    }

    #[must_use]
    pub fn with_resolved_source(mut self, source: impl Into<String>) -> Self {
        self.resolved_source = Some(source.into());
        self
    }

    /// URL to credit when publishing: the resolved source if it is non-empty,
    /// otherwise `original`.
    #[must_use]
    pub fn attribution<'a>(&'a self, original: &'a str) -> &'a str {
        self.resolved_source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(original)
    }
}

/// Turns a source URL into local media files.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Downloads every media item of `source_url`.
    async fn fetch(&self, source_url: &str) -> Result<FetchedMedia, FetchError>;
}

/// A site-specific media source.
///
/// # Object Safety
///
/// Uses `async_trait` so providers can live in the registry as
/// `Arc<dyn MediaProvider>`.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Provider name for logs (e.g. "gelbooru").
    fn name(&self) -> &str;

    /// Exact host strings this provider serves.
    fn hosts(&self) -> &[&'static str];

    /// Downloads the media behind an already-parsed source URL.
    async fn fetch(&self, source: &Url) -> Result<FetchedMedia, FetchError>;
}

/// Builds the registry used by the CLI: Gelbooru and Twitter/X.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] when a configured API base URL does not parse.
pub fn build_default_registry(
    client: FetchClient,
    config: &SourcesConfig,
) -> Result<ProviderRegistry, FetchError> {
    let mut registry = ProviderRegistry::new();
    registry.register(std::sync::Arc::new(GelbooruProvider::new(
        client.clone(),
        &config.gelbooru_api_url,
        config.gelbooru_api_key.clone(),
        config.gelbooru_user_id.clone(),
        config.download_dir.clone(),
    )?));
    registry.register(std::sync::Arc::new(TwitterProvider::new(
        client,
        &config.twitter_api_url,
        config.download_dir.clone(),
    )?));
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribution_prefers_resolved_source() {
        let media = FetchedMedia::new(vec![]).with_resolved_source("https://artist.example/1");
        assert_eq!(
            media.attribution("https://gelbooru.com/index.php?id=1"),
            "https://artist.example/1"
        );
    }

    #[test]
    fn test_attribution_falls_back_on_empty_resolved_source() {
        let media = FetchedMedia::new(vec![]).with_resolved_source("");
        assert_eq!(media.attribution("u1"), "u1");

        let media = FetchedMedia::new(vec![]);
        assert_eq!(media.attribution("u1"), "u1");
    }

    #[tokio::test]
    async fn test_default_registry_covers_supported_hosts() {
        let client = FetchClient::new().unwrap_or_else(|e| panic!("client: {e}"));
        let registry = build_default_registry(client, &SourcesConfig::default())
            .unwrap_or_else(|e| panic!("registry: {e}"));
        // URLs without a post id are rejected by the provider before any request.
        for host in ["gelbooru.com", "www.gelbooru.com", "twitter.com", "x.com", "mobile.twitter.com"] {
            let Err(err) = registry.fetch(&format!("https://{host}/")).await else {
                panic!("{host} fetched without a post id");
            };
            assert!(
                !err.to_string().contains("no provider"),
                "missing provider for {host}: {err}"
            );
        }
    }
}
