//! Clients for the external services the portal depends on.

pub mod generative;
pub mod identity;

use std::time::Duration;

/// Build the shared outbound HTTP client.
///
/// No retries are configured anywhere; a failed call surfaces to the caller.
pub fn build_http_client(
    timeout_secs: u64,
    accept_invalid_certs: bool,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
}
