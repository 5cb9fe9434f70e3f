//! Full pipeline: ingest one source, publish it, then find nothing left to do.

mod support;

use std::path::PathBuf;

use async_trait::async_trait;
use reposter_core::{
    Database, FetchError, FetchedMedia, Ingestor, MediaFetcher, Publisher, RecordStore, VkClient,
};
use support::socket_guard::start_mock_server_or_skip;
use support::vk_mock::{mount_photo, mount_upload_server, mount_wall_post, posting_config};
use tempfile::TempDir;

/// Resolves `u1` to two already-downloaded files and reports no resolved source.
struct LocalFetcher {
    files: Vec<PathBuf>,
}

#[async_trait]
impl MediaFetcher for LocalFetcher {
    async fn fetch(&self, source_url: &str) -> Result<FetchedMedia, FetchError> {
        if source_url == "u1" {
            Ok(FetchedMedia::new(self.files.clone()).with_resolved_source(""))
        } else {
            Err(FetchError::not_found(source_url, "unexpected source"))
        }
    }
}

#[tokio::test]
async fn test_ingest_publish_and_drain() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_upload_server(&mock_server).await;
    mount_photo(&mock_server, "a.jpg", 10, 1).await;
    mount_photo(&mock_server, "b.jpg", 10, 2).await;
    mount_wall_post(&mock_server, "photo10_1,photo10_2", "u1", 1).await;

    let dir = TempDir::new().unwrap();
    let pics = dir.path().join("pics");
    std::fs::create_dir_all(&pics).unwrap();
    let a = pics.join("a.jpg");
    let b = pics.join("b.jpg");
    std::fs::write(&a, b"a-bytes").unwrap();
    std::fs::write(&b, b"b-bytes").unwrap();

    let store = RecordStore::new(Database::new(&dir.path().join("reposter.db")).await.unwrap());

    // Ingest.
    let ingestor = Ingestor::new(
        store.clone(),
        LocalFetcher {
            files: vec![a.clone(), b.clone()],
        },
    );
    ingestor.ingest_lines(["u1"]).await.unwrap();

    let record = store.get(1).await.unwrap().unwrap();
    assert_eq!(record.filenames, vec![a, b]);
    assert_eq!(record.source_url, "u1");
    assert!(!record.posted);

    // Publish.
    let publisher = Publisher::new(
        store.clone(),
        VkClient::new(posting_config(&mock_server)).unwrap(),
    );
    let stats = publisher.run().await.unwrap();
    assert_eq!(stats.records_posted, 1);
    assert_eq!(stats.attachments_uploaded, 2);
    assert!(store.get(1).await.unwrap().unwrap().posted);

    // A second run finds nothing and makes no calls (mock expectations stay at 1).
    let stats = publisher.run().await.unwrap();
    assert_eq!(stats.records_posted, 0);
    assert!(publisher.publish_next().await.unwrap().is_none());
}
