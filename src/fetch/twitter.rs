//! Twitter/X provider.
//!
//! Status URLs look like `https://twitter.com/<user>/status/<id>`. Tweet
//! metadata comes from the public syndication endpoint, which needs no
//! account.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{FetchClient, FetchError, FetchedMedia, MediaProvider, extension_from_url};

/// Public syndication endpoint.
pub const DEFAULT_TWITTER_API_URL: &str = "https://cdn.syndication.twimg.com/tweet-result";

// The endpoint only checks that a token is present.
const SYNDICATION_TOKEN: &str = "a";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TweetResult {
    #[serde(default)]
    user: Option<TweetUser>,
    #[serde(default)]
    media_details: Vec<MediaDetail>,
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct TweetUser {
    screen_name: String,
}

#[derive(Debug, Deserialize)]
struct MediaDetail {
    #[serde(rename = "type")]
    kind: String,
    media_url_https: String,
}

#[derive(Debug, Deserialize)]
struct Photo {
    url: String,
}

impl TweetResult {
    /// Photo URLs in tweet order. `mediaDetails` wins; `photos` is the fallback.
    fn photo_urls(&self) -> Vec<&str> {
        let detailed: Vec<&str> = self
            .media_details
            .iter()
            .filter(|m| m.kind == "photo")
            .map(|m| m.media_url_https.as_str())
            .collect();
        if detailed.is_empty() {
            self.photos.iter().map(|p| p.url.as_str()).collect()
        } else {
            detailed
        }
    }
}

/// Downloads every photo attached to a tweet.
#[derive(Debug, Clone)]
pub struct TwitterProvider {
    client: FetchClient,
    api_url: Url,
    download_dir: PathBuf,
}

impl TwitterProvider {
    /// Creates a provider reading tweet metadata from `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when `api_url` does not parse.
    pub fn new(
        client: FetchClient,
        api_url: &str,
        download_dir: PathBuf,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client,
            api_url: Url::parse(api_url).map_err(|_| FetchError::invalid_url(api_url))?,
            download_dir,
        })
    }

    fn tweet_query_url(&self, tweet_id: &str) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("id", tweet_id)
            .append_pair("token", SYNDICATION_TOKEN);
        url
    }
}

/// Status id (last path segment) and the username segment, if present.
fn parse_status_url(source: &Url) -> Option<(String, Option<String>)> {
    let segments: Vec<&str> = source
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    let id = segments.last()?;
    if !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let user = match segments.as_slice() {
        [user, "status", ..] => Some((*user).to_string()),
        _ => None,
    };
    Some(((*id).to_string(), user))
}

#[async_trait]
impl MediaProvider for TwitterProvider {
    fn name(&self) -> &str {
        "twitter"
    }

    fn hosts(&self) -> &[&'static str] {
        &["twitter.com", "x.com", "mobile.twitter.com"]
    }

    #[instrument(skip(self), fields(provider = "twitter", source = %source))]
    async fn fetch(&self, source: &Url) -> Result<FetchedMedia, FetchError> {
        let Some((tweet_id, url_user)) = parse_status_url(source) else {
            return Err(FetchError::not_found(
                source.as_str(),
                "URL does not end in a status id",
            ));
        };

        let api_url = self.tweet_query_url(&tweet_id);
        let tweet: TweetResult = self.client.get_json(&api_url).await?;

        let username = tweet
            .user
            .as_ref()
            .map(|u| u.screen_name.clone())
            .or(url_user)
            .unwrap_or_else(|| "twitter".to_string());

        let photo_urls = tweet.photo_urls();
        debug!(photos = photo_urls.len(), %username, "tweet metadata");
        if photo_urls.is_empty() {
            return Err(FetchError::not_found(source.as_str(), "tweet has no photos"));
        }

        let mut paths = Vec::with_capacity(photo_urls.len());
        for (index, raw) in photo_urls.into_iter().enumerate() {
            let photo_url = Url::parse(raw)
                .map_err(|_| FetchError::decode(api_url.as_str(), "photo URL is not a URL"))?;
            let dest = self.download_dir.join(format!(
                "{username}_{tweet_id}_{index}.{}",
                extension_from_url(&photo_url)
            ));
            self.client.download_to_path(&photo_url, &dest).await?;
            paths.push(dest);
        }

        Ok(FetchedMedia::new(paths))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn test_parse_status_url_extracts_id_and_user() {
        let url = Url::parse("https://twitter.com/artist/status/1234567890").unwrap();
        assert_eq!(
            parse_status_url(&url),
            Some(("1234567890".to_string(), Some("artist".to_string())))
        );
    }

    #[test]
    fn test_parse_status_url_tolerates_trailing_slash() {
        let url = Url::parse("https://x.com/artist/status/42/").unwrap();
        assert_eq!(parse_status_url(&url).unwrap().0, "42");
    }

    #[test]
    fn test_parse_status_url_rejects_profile_page() {
        let url = Url::parse("https://twitter.com/artist").unwrap();
        assert!(parse_status_url(&url).is_none());
    }

    #[test]
    fn test_photo_urls_falls_back_to_photos_list() {
        let tweet: TweetResult = serde_json::from_value(serde_json::json!({
            "photos": [{"url": "https://pbs.example/a.jpg"}, {"url": "https://pbs.example/b.jpg"}]
        }))
        .unwrap();
        assert_eq!(
            tweet.photo_urls(),
            vec!["https://pbs.example/a.jpg", "https://pbs.example/b.jpg"]
        );
    }

    #[test]
    fn test_photo_urls_skips_videos() {
        let tweet: TweetResult = serde_json::from_value(serde_json::json!({
            "mediaDetails": [
                {"type": "video", "media_url_https": "https://pbs.example/thumb.jpg"},
                {"type": "photo", "media_url_https": "https://pbs.example/p.png"}
            ]
        }))
        .unwrap();
        assert_eq!(tweet.photo_urls(), vec!["https://pbs.example/p.png"]);
    }

    #[tokio::test]
    async fn test_fetch_downloads_photos_in_order() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let base = mock_server.uri();
        Mock::given(method("GET"))
            .and(path("/tweet-result"))
            .and(query_param("id", "555"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id_str": "555",
                "user": {"screen_name": "painter"},
                "mediaDetails": [
                    {"type": "photo", "media_url_https": format!("{base}/media/first.jpg")},
                    {"type": "photo", "media_url_https": format!("{base}/media/second.png")}
                ]
            })))
            .mount(&mock_server)
            .await;
        for (name, body) in [("first.jpg", b"one".as_slice()), ("second.png", b"two".as_slice())] {
            Mock::given(method("GET"))
                .and(path(format!("/media/{name}")))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
                .mount(&mock_server)
                .await;
        }

        let dir = TempDir::new().unwrap();
        let provider = TwitterProvider::new(
            FetchClient::new().unwrap(),
            &format!("{base}/tweet-result"),
            dir.path().to_path_buf(),
        )
        .unwrap();
        let source = Url::parse("https://twitter.com/someone/status/555").unwrap();

        let media = provider.fetch(&source).await.unwrap();

        assert_eq!(
            media.paths,
            vec![
                dir.path().join("painter_555_0.jpg"),
                dir.path().join("painter_555_1.png"),
            ]
        );
        assert!(media.resolved_source.is_none());
        assert_eq!(std::fs::read(&media.paths[1]).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_fetch_tweet_without_photos_is_not_found() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/tweet-result"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id_str": "9",
                "user": {"screen_name": "painter"}
            })))
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let provider = TwitterProvider::new(
            FetchClient::new().unwrap(),
            &format!("{}/tweet-result", mock_server.uri()),
            dir.path().to_path_buf(),
        )
        .unwrap();
        let source = Url::parse("https://x.com/painter/status/9").unwrap();

        let err = provider.fetch(&source).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_deleted_tweet_maps_404_to_not_found() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let provider = TwitterProvider::new(
            FetchClient::new().unwrap(),
            &format!("{}/tweet-result", mock_server.uri()),
            dir.path().to_path_buf(),
        )
        .unwrap();
        let source = Url::parse("https://twitter.com/painter/status/10").unwrap();

        let err = provider.fetch(&source).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }), "got {err:?}");
    }
}
