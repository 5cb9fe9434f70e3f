//! VK API client for the wall photo upload protocol.
//!
//! Publishing one photo takes three calls: ask for an upload server, POST the
//! file there, then register the stored file with `photos.saveWallPhoto`. The
//! resulting attachment tokens go out in a single `wall.post`.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};
use url::Url;

use super::PublishError;
use super::types::{Envelope, PostReceipt, SavedPhoto, UploadTarget, UploadToken, WallPost};
use crate::config::{ConfigError, PostingConfig};
use crate::http_client;

/// Largest file the upload server accepts: 10 MiB.
pub const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Multipart field name the upload server reads.
const UPLOAD_FIELD: &str = "photo";

/// The four remote steps of publishing a record.
///
/// [`Publisher`](super::Publisher) drives these in order; tests substitute
/// a recording fake.
#[async_trait]
pub trait WallClient: Send + Sync {
    /// `photos.getWallUploadServer`.
    async fn request_upload_target(&self) -> Result<UploadTarget, PublishError>;

    /// Streams `path` to the upload server.
    async fn upload_binary(
        &self,
        target: &UploadTarget,
        path: &Path,
    ) -> Result<UploadToken, PublishError>;

    /// `photos.saveWallPhoto`.
    async fn register_media(&self, token: &UploadToken) -> Result<SavedPhoto, PublishError>;

    /// `wall.post` on the community wall.
    async fn publish_post(&self, post: &WallPost) -> Result<(), PublishError>;
}

/// [`WallClient`] over the VK HTTP API.
#[derive(Debug, Clone)]
pub struct VkClient {
    client: Client,
    config: PostingConfig,
    base_url: String,
}

impl VkClient {
    /// Creates a client with the default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the credentials are incomplete, the base
    /// URL does not parse, or the HTTP client cannot be built.
    pub fn new(config: PostingConfig) -> Result<Self, ConfigError> {
        let client = http_client::build_http_client()
            .map_err(|e| ConfigError::invalid("http client", e.to_string()))?;
        Self::with_client(client, config)
    }

    /// Creates a client that reuses `client`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new), minus client construction.
    pub fn with_client(client: Client, config: PostingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ConfigError::invalid("posting.api_base_url", e.to_string()))?;
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn group_id(&self) -> String {
        self.config.group_id.to_string()
    }

    /// Builds `<base>/<method>?<params>&access_token=..&v=..` with every value encoded.
    fn method_url(&self, method: &str, params: &[(&str, String)]) -> Result<Url, PublishError> {
        let endpoint = format!("{}/{method}", self.base_url);
        let auth = [
            ("access_token", self.config.access_token.as_str()),
            ("v", self.config.api_version.as_str()),
        ];
        Url::parse_with_params(
            &endpoint,
            params
                .iter()
                .map(|(k, v)| (*k, v.as_str()))
                .chain(auth),
        )
        .map_err(|e| PublishError::decode(method, e.to_string()))
    }

    async fn get_body(&self, method: &str, url: Url) -> Result<Vec<u8>, PublishError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PublishError::network(method, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::HttpStatus {
                endpoint: method.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PublishError::network(method, e))?;
        Ok(body.to_vec())
    }

    async fn call_method<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, PublishError> {
        let url = self.method_url(method, params)?;
        let body = self.get_body(method, url).await?;
        decode_envelope(method, &body)
    }
}

/// Unwraps `{"response": ..}` or turns `{"error": ..}` into [`PublishError::Api`].
fn decode_envelope<T: DeserializeOwned>(method: &str, body: &[u8]) -> Result<T, PublishError> {
    let envelope: Envelope<T> =
        serde_json::from_slice(body).map_err(|e| PublishError::decode(method, e.to_string()))?;
    if let Some(error) = envelope.error {
        return Err(PublishError::Api {
            method: method.to_string(),
            code: error.error_code,
            message: error.error_msg,
        });
    }
    envelope
        .response
        .ok_or_else(|| PublishError::decode(method, "neither response nor error present"))
}

/// Fails with [`PublishError::PayloadTooLarge`] when `path` exceeds the limit.
///
/// # Returns
///
/// The file size in bytes.
pub(crate) async fn check_upload_size(path: &Path) -> Result<u64, PublishError> {
    let size = tokio::fs::metadata(path)
        .await
        .map_err(|e| PublishError::io(path, e))?
        .len();
    if size > MAX_UPLOAD_SIZE {
        return Err(PublishError::PayloadTooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_UPLOAD_SIZE,
        });
    }
    Ok(size)
}

#[async_trait]
impl WallClient for VkClient {
    #[instrument(skip(self), fields(group_id = self.config.group_id))]
    async fn request_upload_target(&self) -> Result<UploadTarget, PublishError> {
        let target: UploadTarget = self
            .call_method("photos.getWallUploadServer", &[("group_id", self.group_id())])
            .await?;
        debug!(upload_url = %target.upload_url, "got upload server");
        Ok(target)
    }

    #[instrument(skip(self, target), fields(path = %path.display()))]
    async fn upload_binary(
        &self,
        target: &UploadTarget,
        path: &Path,
    ) -> Result<UploadToken, PublishError> {
        const ENDPOINT: &str = "upload server";

        let size = check_upload_size(path).await?;
        let file = File::open(path)
            .await
            .map_err(|e| PublishError::io(path, e))?;

        let file_name = path
            .file_name()
            .map_or_else(|| "photo".to_string(), |n| n.to_string_lossy().into_owned());
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), size)
            .file_name(file_name)
            .mime_str(mime.essence_str())
            .map_err(|e| PublishError::network(ENDPOINT, e))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let upload_url = Url::parse(&target.upload_url)
            .map_err(|e| PublishError::decode(ENDPOINT, format!("bad upload_url: {e}")))?;
        let response = self
            .client
            .post(upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::network(ENDPOINT, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::HttpStatus {
                endpoint: ENDPOINT.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| PublishError::network(ENDPOINT, e))?;
        let token: UploadToken = serde_json::from_slice(&body)
            .map_err(|e| PublishError::decode(ENDPOINT, e.to_string()))?;

        // The server answers 200 with `"photo": "[]"` when it rejected the file.
        if token.photo.is_empty() || token.photo == "[]" {
            return Err(PublishError::decode(ENDPOINT, "upload server stored no photo"));
        }

        debug!(size, server = token.server, "uploaded");
        Ok(token)
    }

    #[instrument(skip(self, token), fields(server = token.server))]
    async fn register_media(&self, token: &UploadToken) -> Result<SavedPhoto, PublishError> {
        const METHOD: &str = "photos.saveWallPhoto";
        let saved: Vec<SavedPhoto> = self
            .call_method(
                METHOD,
                &[
                    ("group_id", self.group_id()),
                    ("server", token.server.to_string()),
                    ("photo", token.photo.clone()),
                    ("hash", token.hash.clone()),
                ],
            )
            .await?;
        let photo = saved
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::decode(METHOD, "empty photo list"))?;
        debug!(attachment = %photo, "registered photo");
        Ok(photo)
    }

    #[instrument(skip(self, post), fields(attachments = post.attachments.len(), copyright = %post.copyright))]
    async fn publish_post(&self, post: &WallPost) -> Result<(), PublishError> {
        const METHOD: &str = "wall.post";
        let url = self.method_url(
            METHOD,
            &[
                ("owner_id", format!("-{}", self.config.group_id)),
                ("from_group", "1".to_string()),
                ("attachments", post.attachments_param()),
                ("copyright", post.copyright.clone()),
            ],
        )?;
        let body = self.get_body(METHOD, url).await?;

        match decode_envelope::<PostReceipt>(METHOD, &body) {
            Ok(receipt) => {
                debug!(post_id = receipt.post_id, "wall post created");
                Ok(())
            }
            Err(err @ PublishError::Api { .. }) => Err(err),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable wall.post response");
                Ok(())
            }
        }
    }
}
