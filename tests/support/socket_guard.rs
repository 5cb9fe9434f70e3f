use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "REPOSTER_REQUIRE_SOCKET_TESTS";

#[must_use]
pub fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_ENV)
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a mock server, or returns `None` when localhost sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }
    if socket_tests_required() {
        panic!("cannot bind localhost socket; unset {REQUIRE_ENV} to allow skipping");
    }
    eprintln!("[socket-bound-test] cannot bind localhost socket; skipping");
    None
}
