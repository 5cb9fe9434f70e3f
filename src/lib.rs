//! Reposter Core Library
//!
//! Downloads media from image-board and social-media posts, keeps a record of
//! each download in SQLite, and republishes unposted records to a VK
//! community wall with the source URL as attribution.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - TOML configuration with environment overrides
//! - [`db`] - Database connection and schema management
//! - [`record`] - Download record persistence
//! - [`fetch`] - Media providers and host dispatch
//! - [`ingest`] - Source list to stored records
//! - [`publish`] - VK wall upload protocol and publishing loop

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod db;
pub mod fetch;
pub mod http_client;
pub mod ingest;
pub mod publish;
pub mod record;

mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError, DEFAULT_CONFIG_PATH, PostingConfig, SourcesConfig};
pub use db::{Database, DbError};
pub use fetch::{
    FetchClient, FetchError, FetchedMedia, MediaFetcher, MediaProvider, ProviderRegistry,
    build_default_registry,
};
pub use ingest::{DEFAULT_SOURCES_PATH, IngestError, IngestStats, Ingestor};
pub use publish::{PublishError, PublishStats, Publisher, VkClient, WallClient};
pub use record::{
    DownloadRecord, NewDownloadRecord, RecordRepository, RecordStore, StoreError,
};
