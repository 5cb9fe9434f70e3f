//! Application configuration.
//!
//! Settings come from a TOML file (default `configs/config.toml`). Secrets
//! are normally supplied through the environment or a `.env` file, which
//! override whatever the file holds:
//!
//! | Variable              | Field                       |
//! |-----------------------|-----------------------------|
//! | `ACCESS_TOKEN`        | `posting.access_token`      |
//! | `GROUP_ID`            | `posting.group_id`          |
//! | `GELBOORU_ACCESS_KEY` | `sources.gelbooru_api_key`  |
//! | `GELBOORU_USER_ID`    | `sources.gelbooru_user_id`  |
//! | `REPOSTER_DATABASE`   | `database.path`             |

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::fetch::{DEFAULT_GELBOORU_API_URL, DEFAULT_TWITTER_API_URL};

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.toml";

/// VK API endpoint root.
pub const DEFAULT_VK_API_URL: &str = "https://api.vk.com/method";

/// VK API version sent with every call.
pub const DEFAULT_VK_API_VERSION: &str = "5.131";

const DEFAULT_DATABASE_PATH: &str = "reposter.db";
const DEFAULT_DOWNLOAD_DIR: &str = "pics";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// The file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// The file path.
        path: PathBuf,
        /// The TOML decoder error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is present but unusable.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Config key or environment variable name.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A value required for the requested operation is absent.
    #[error("missing required setting {key}")]
    Missing {
        /// Config key or environment variable name.
        key: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub posting: PostingConfig,
    pub sources: SourcesConfig,
}

/// Where the record store lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

/// VK community wall credentials and endpoint.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    /// Community access token with `photos` and `wall` scopes.
    pub access_token: String,
    /// Numeric community id (positive; posts go to owner `-group_id`).
    pub group_id: u64,
    /// Method endpoint root, e.g. `https://api.vk.com/method`.
    pub api_base_url: String,
    /// Value of the `v` parameter.
    pub api_version: String,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            group_id: 0,
            api_base_url: DEFAULT_VK_API_URL.to_string(),
            api_version: DEFAULT_VK_API_VERSION.to_string(),
        }
    }
}

// Custom Debug impl that redacts the access token.
impl fmt::Debug for PostingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostingConfig")
            .field("access_token", &redacted(&self.access_token))
            .field("group_id", &self.group_id)
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl PostingConfig {
    /// Checks that posting credentials are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for an empty token or a zero group id.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::Missing { key: "ACCESS_TOKEN" });
        }
        if self.group_id == 0 {
            return Err(ConfigError::Missing { key: "GROUP_ID" });
        }
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::invalid("posting.api_version", "must not be empty"));
        }
        Ok(())
    }
}

/// Media provider settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Root directory for downloaded media.
    pub download_dir: PathBuf,
    /// Gelbooru DAPI endpoint.
    pub gelbooru_api_url: String,
    pub gelbooru_api_key: Option<String>,
    pub gelbooru_user_id: Option<String>,
    /// Tweet metadata endpoint.
    pub twitter_api_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            gelbooru_api_url: DEFAULT_GELBOORU_API_URL.to_string(),
            gelbooru_api_key: None,
            gelbooru_user_id: None,
            twitter_api_url: DEFAULT_TWITTER_API_URL.to_string(),
        }
    }
}

impl fmt::Debug for SourcesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcesConfig")
            .field("download_dir", &self.download_dir)
            .field("gelbooru_api_url", &self.gelbooru_api_url)
            .field(
                "gelbooru_api_key",
                &self.gelbooru_api_key.as_deref().map(redacted),
            )
            .field("gelbooru_user_id", &self.gelbooru_user_id)
            .field("twitter_api_url", &self.twitter_api_url)
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "[REDACTED]" }
}

impl AppConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid for this schema.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Reads and parses the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Loads `.env` (if present), the config file, then applies process
    /// environment overrides.
    ///
    /// A missing config file is not an error when the path is the default
    /// location; secrets may come entirely from the environment.
    ///
    /// # Errors
    ///
    /// Returns file errors for an explicitly chosen path and
    /// [`ConfigError::InvalidValue`] for malformed environment values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "loaded .env");
        }

        let mut config = if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
            debug!(path = %path.display(), "no config file; using defaults");
            Self::default()
        } else {
            Self::load_file(path)?
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overwrites fields from environment-style lookups. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `GROUP_ID` is not a positive integer.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("ACCESS_TOKEN") {
            self.posting.access_token = token;
        }
        if let Some(group) = get("GROUP_ID") {
            self.posting.group_id = parse_group_id(&group)?;
        }
        if let Some(key) = get("GELBOORU_ACCESS_KEY") {
            self.sources.gelbooru_api_key = Some(key);
        }
        if let Some(user) = get("GELBOORU_USER_ID") {
            self.sources.gelbooru_user_id = Some(user);
        }
        if let Some(path) = get("REPOSTER_DATABASE") {
            self.database.path = PathBuf::from(path);
        }
        Ok(())
    }
}

/// Accepts `123` and the `-123` owner-id form VK pages display.
fn parse_group_id(raw: &str) -> Result<u64, ConfigError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    match digits.parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid("GROUP_ID", "must not be zero")),
        Ok(id) => Ok(id),
        Err(e) => Err(ConfigError::invalid("GROUP_ID", format!("'{raw}': {e}"))),
    }
}
