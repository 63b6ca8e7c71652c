//! HTTP fetcher implementation
//!
//! This module handles all contact with the remote service:
//! - Building HTTP clients with a proper user agent string
//! - Retrieving whole response bodies
//! - The idempotent "make sure this URL is saved at this path" primitive
//!
//! There is no retry: a failed fetch is abandoned for the run and picked up
//! again by the next run through the skip-if-present check.

use crate::config::UserAgentConfig;
use crate::crawler::gate::AdmissionGate;
use crate::storage::{existing_len, is_complete, write_atomic};
use crate::MirrorError;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Result of a successful fetch-to-file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A complete file was already present; no request was made
    Skipped,

    /// The resource was retrieved and written
    Fetched {
        /// Number of bytes written
        bytes: usize,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use picmirror::config::UserAgentConfig;
/// use picmirror::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(300))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves the full body at `url`, following redirects
///
/// # Returns
///
/// * `Ok((String, Vec<u8>))` - The final URL after redirects and the body
/// * `Err(MirrorError)` - Transport error or a non-success status
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<(String, Vec<u8>), MirrorError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| MirrorError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().to_string();
    let body = response
        .bytes()
        .await
        .map_err(|source| MirrorError::Transport {
            url: url.to_string(),
            source,
        })?;

    Ok((final_url, body.to_vec()))
}

/// Retrieves the body at `url` as text
///
/// Invalid UTF-8 is replaced rather than rejected; listing pages are only
/// scanned for key patterns.
pub async fn fetch_text(client: &Client, url: &str) -> Result<(String, String), MirrorError> {
    let (final_url, body) = fetch_bytes(client, url).await?;
    Ok((final_url, String::from_utf8_lossy(&body).into_owned()))
}

/// Ensures the resource at `url` is saved at `path`
///
/// # Skip Rule
///
/// | Existing file | `expected_size` | Action |
/// |---------------|-----------------|--------|
/// | none | any | fetch |
/// | length 0 | unknown | fetch |
/// | length > 0 | unknown | skip |
/// | length == n | `Some(n)` | skip |
/// | length != n | `Some(n)` | fetch |
///
/// A fetch is admitted as a network operation (waiting if the pool is
/// saturated), reads the whole body, and writes it atomically with owner-only
/// permissions. The operation is released on every exit path.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `gate` - Admission gate for the network slot
/// * `url` - The remote resource
/// * `path` - Where the resource is saved
/// * `expected_size` - Exact payload size if known
///
/// # Returns
///
/// * `Ok(FetchOutcome)` - The file is present and complete
/// * `Err(MirrorError)` - Retrieval, read or write failed
pub async fn fetch_to_file(
    client: &Client,
    gate: &AdmissionGate,
    url: &str,
    path: &Path,
    expected_size: Option<u64>,
) -> Result<FetchOutcome, MirrorError> {
    if is_complete(existing_len(path).await, expected_size) {
        return Ok(FetchOutcome::Skipped);
    }

    let _op = gate.begin_network_op().await?;

    let (_, body) = fetch_bytes(client, url).await?;

    if let Some(expected) = expected_size {
        if body.len() as u64 != expected {
            tracing::warn!(
                "{} returned {} bytes, metadata declared {}",
                url,
                body.len(),
                expected
            );
        }
    }

    write_atomic(path, &body)
        .await
        .map_err(|source| MirrorError::Persistence {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(FetchOutcome::Fetched { bytes: body.len() })
}
