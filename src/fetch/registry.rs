//! Host-keyed provider dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use url::Url;

use super::{FetchError, FetchedMedia, MediaFetcher, MediaProvider};

/// Dispatch table from URL host to the provider serving it.
///
/// A host that nobody registered is reported as [`FetchError::NotFound`]
/// rather than producing an empty download.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn MediaProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` for every host it declares. Later registrations win.
    pub fn register(&mut self, provider: Arc<dyn MediaProvider>) {
        for host in provider.hosts() {
            debug!(provider = provider.name(), host, "registering media provider");
            self.providers
                .insert((*host).to_string(), Arc::clone(&provider));
        }
    }

    fn provider_for(&self, url: &Url) -> Option<&Arc<dyn MediaProvider>> {
        let host = url.host_str()?;
        self.providers.get(&normalize_host(host))
    }
}

/// `www.` is dropped so `www.gelbooru.com` dispatches like `gelbooru.com`.
fn normalize_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

#[async_trait]
impl MediaFetcher for ProviderRegistry {
    #[instrument(skip(self))]
    async fn fetch(&self, source_url: &str) -> Result<FetchedMedia, FetchError> {
        let url = Url::parse(source_url).map_err(|_| FetchError::invalid_url(source_url))?;

        let Some(provider) = self.provider_for(&url) else {
            return Err(FetchError::not_found(
                source_url,
                format!(
                    "no provider for host '{}'",
                    url.host_str().unwrap_or_default()
                ),
            ));
        };

        let media = provider.fetch(&url).await?;
        if media.paths.is_empty() {
            return Err(FetchError::not_found(
                source_url,
                format!("{} returned no media", provider.name()),
            ));
        }

        info!(
            provider = provider.name(),
            files = media.paths.len(),
            resolved = media.resolved_source.as_deref().unwrap_or(""),
            "fetched media"
        );
        Ok(media)
    }
}
