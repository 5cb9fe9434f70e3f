//! Gelbooru provider.
//!
//! Post pages look like `https://gelbooru.com/index.php?page=post&s=view&id=123`.
//! The DAPI returns the post's file URL and the artwork's original `source`,
//! which becomes the resolved attribution.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{FetchClient, FetchError, FetchedMedia, MediaProvider, extension_from_url, redact_url};

/// Public DAPI endpoint.
pub const DEFAULT_GELBOORU_API_URL: &str = "https://gelbooru.com/index.php";

/// Subdirectory of the download dir that Gelbooru files land in.
const GELBOORU_SUBDIR: &str = "gelbooru";

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    post: Vec<GelbooruPost>,
}

#[derive(Debug, Deserialize)]
struct GelbooruPost {
    file_url: String,
    #[serde(default)]
    source: String,
}

/// Downloads the single image of a Gelbooru post.
#[derive(Clone)]
pub struct GelbooruProvider {
    client: FetchClient,
    api_url: Url,
    api_key: Option<String>,
    user_id: Option<String>,
    download_dir: PathBuf,
}

impl fmt::Debug for GelbooruProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GelbooruProvider")
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("user_id", &self.user_id)
            .field("download_dir", &self.download_dir)
            .finish_non_exhaustive()
    }
}

impl GelbooruProvider {
    /// Creates a provider talking to `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when `api_url` does not parse.
    pub fn new(
        client: FetchClient,
        api_url: &str,
        api_key: Option<String>,
        user_id: Option<String>,
        download_dir: PathBuf,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client,
            api_url: Url::parse(api_url).map_err(|_| FetchError::invalid_url(api_url))?,
            api_key,
            user_id,
            download_dir,
        })
    }

    fn post_query_url(&self, post_id: &str) -> Url {
        let mut url = self.api_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", "dapi")
                .append_pair("s", "post")
                .append_pair("q", "index")
                .append_pair("json", "1")
                .append_pair("id", post_id);
            if let Some(key) = &self.api_key {
                query.append_pair("api_key", key);
            }
            if let Some(user) = &self.user_id {
                query.append_pair("user_id", user);
            }
        }
        url
    }
}

/// Extracts the numeric `id` query parameter of a post page.
fn post_id(source: &Url) -> Option<String> {
    source
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
}

#[async_trait]
impl MediaProvider for GelbooruProvider {
    fn name(&self) -> &str {
        "gelbooru"
    }

    fn hosts(&self) -> &[&'static str] {
        &["gelbooru.com"]
    }

    #[instrument(skip(self), fields(provider = "gelbooru", source = %source))]
    async fn fetch(&self, source: &Url) -> Result<FetchedMedia, FetchError> {
        let Some(id) = post_id(source) else {
            return Err(FetchError::not_found(
                source.as_str(),
                "post URL has no numeric `id` parameter",
            ));
        };

        let api_url = self.post_query_url(&id);
        let response: PostsResponse = self.client.get_json(&api_url).await?;
        let Some(post) = response.post.into_iter().next() else {
            return Err(FetchError::not_found(source.as_str(), "post does not exist"));
        };
        debug!(file_url = %post.file_url, original_source = %post.source, "gelbooru post");

        let file_url = Url::parse(&post.file_url)
            .map_err(|_| FetchError::decode(redact_url(&api_url), "file_url is not a URL"))?;
        let dest = self
            .download_dir
            .join(GELBOORU_SUBDIR)
            .join(format!("{id}.{}", extension_from_url(&file_url)));
        self.client.download_to_path(&file_url, &dest).await?;

        let media = FetchedMedia::new(vec![dest]);
        Ok(if post.source.trim().is_empty() {
            media
        } else {
            media.with_resolved_source(post.source)
        })
    }
}
