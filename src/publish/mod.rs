//! Publishing downloaded records to a VK community wall.
//!
//! # Overview
//!
//! - [`Publisher`] - drains unposted records one at a time
//! - [`WallClient`] - the remote steps (upload target, upload, register, post)
//! - [`VkClient`] - [`WallClient`] over the VK HTTP API
//! - [`PublishError`] - run-ending failures
//!
//! # Example
//!
//! ```ignore
//! use reposter_core::publish::{Publisher, VkClient};
//! use reposter_core::record::RecordStore;
//!
//! let publisher = Publisher::new(store, VkClient::new(config.posting.clone())?);
//! let stats = publisher.run().await?;
//! println!("{} records posted", stats.records_posted);
//! ```

mod client;
mod error;
mod service;
mod types;

pub use client::{MAX_UPLOAD_SIZE, VkClient, WallClient};
pub use error::PublishError;
pub use service::{POST_DELAY, PublishStats, Publisher};
pub use types::{PostReceipt, SavedPhoto, UploadTarget, UploadToken, WallPost};
