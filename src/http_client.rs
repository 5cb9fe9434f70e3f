//! Shared HTTP client construction policy.
//!
//! Media providers and the wall client build their `reqwest` clients here so
//! timeouts, User-Agent and compression stay consistent.

use std::time::Duration;

use reqwest::Client;

use crate::user_agent;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whole-request timeout; enough for a 10 MiB upload on a slow link.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Builds a client with the project's default timeouts.
///
/// # Errors
///
/// Returns the underlying `reqwest::Error` when the TLS backend or system
/// configuration cannot be initialised.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(user_agent::default_user_agent())
        .gzip(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client_succeeds_with_defaults() {
        assert!(build_http_client().is_ok());
    }
}
