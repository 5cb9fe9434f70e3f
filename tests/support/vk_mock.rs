//! Wiremock stand-in for the VK wall upload protocol.

use reposter_core::PostingConfig;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GROUP_ID: u64 = 10;
pub const TOKEN: &str = "test-token";

/// Posting config aimed at `mock_server`.
pub fn posting_config(mock_server: &MockServer) -> PostingConfig {
    PostingConfig {
        access_token: TOKEN.to_string(),
        group_id: GROUP_ID,
        api_base_url: format!("{}/method", mock_server.uri()),
        api_version: "5.131".to_string(),
    }
}

/// `photos.getWallUploadServer` pointing at `/upload` on the same server.
pub async fn mount_upload_server(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/method/photos.getWallUploadServer"))
        .and(query_param("group_id", GROUP_ID.to_string()))
        .and(query_param("access_token", TOKEN))
        .and(query_param("v", "5.131"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": {
                "album_id": -14,
                "upload_url": format!("{}/upload", mock_server.uri()),
                "user_id": 0
            }
        })))
        .mount(mock_server)
        .await;
}

/// Accepts an upload of `file_name` and registers it as `photo{owner_id}_{photo_id}`.
pub async fn mount_photo(mock_server: &MockServer, file_name: &str, owner_id: i64, photo_id: i64) {
    let stored = format!("stored-{file_name}");
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains(format!("filename=\"{file_name}\"")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "server": 842,
            "photo": stored,
            "hash": "hash"
        })))
        .expect(1)
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/method/photos.saveWallPhoto"))
        .and(query_param("photo", stored.as_str()))
        .and(query_param("server", "842"))
        .and(query_param("hash", "hash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": [{"id": photo_id, "owner_id": owner_id, "album_id": -14}]
        })))
        .expect(1)
        .mount(mock_server)
        .await;
}

/// `wall.post` expecting exactly these attachments and copyright, `times` times.
pub async fn mount_wall_post(mock_server: &MockServer, attachments: &str, copyright: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/method/wall.post"))
        .and(query_param("owner_id", format!("-{GROUP_ID}")))
        .and(query_param("from_group", "1"))
        .and(query_param("attachments", attachments))
        .and(query_param("copyright", copyright))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": {"post_id": 1}
        })))
        .expect(times)
        .mount(mock_server)
        .await;
}
