//! HTTP plumbing for the RobotEvents API: a pluggable client, bearer-token
//! auth, status mapping with retry, and page walking.

mod auth;
mod basic;
mod client;

pub use auth::BearerToken;
pub use basic::BasicClient;
pub use client::HttpClient;

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::parser::{Page, parse_page};

/// Largest page size the API accepts.
pub const PER_PAGE: u32 = 250;

/// Longest single wait between retries.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(15 * 60);

/// Backoff for rate limiting (429) and server errors (5xx).
///
/// The wait before retry `n` (0-based) is `Retry-After` (or `base_delay`
/// when the header is absent) multiplied by `3^n`, capped at
/// [`MAX_RETRY_DELAY`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 7,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .unwrap_or(self.base_delay)
            .checked_mul(3u32.saturating_pow(attempt))
            .map_or(MAX_RETRY_DELAY, |d| d.min(MAX_RETRY_DELAY))
    }
}

fn retry_after(resp: &reqwest::Response) -> Option<Duration> {
    resp.headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// GETs `url` and returns the raw body of a successful response.
///
/// 429 and 5xx responses are retried per `retry`; 401/403 become
/// [`ApiError::Unauthorized`] and 404 [`ApiError::NotFound`].
#[tracing::instrument(skip_all, fields(url = %url))]
pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &Url,
    retry: &RetryPolicy,
) -> Result<Vec<u8>> {
    let mut attempt = 0;

    loop {
        let mut req = reqwest::Request::new(reqwest::Method::GET, url.clone());
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        let resp = client.execute(req).await?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if attempt >= retry.max_retries {
                return Err(ApiError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                });
            }
            let wait = retry.delay(attempt, retry_after(&resp));
            warn!(
                status = status.as_u16(),
                attempt,
                wait_secs = wait.as_secs_f64(),
                "Rate limited or server error, retrying"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
            continue;
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ApiError::Unauthorized {
                    status,
                    url: url.to_string(),
                });
            }
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound(url.to_string())),
            s if !s.is_success() => {
                return Err(ApiError::Status {
                    status,
                    url: url.to_string(),
                });
            }
            _ => {}
        }

        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), "Response received");
        return Ok(bytes.to_vec());
    }
}

/// Fetches every page of a list endpoint and concatenates the `data` arrays.
#[tracing::instrument(skip_all, fields(url = %url))]
pub async fn fetch_all_pages<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    url: &Url,
    retry: &RetryPolicy,
) -> Result<Vec<T>> {
    let mut all = Vec::new();
    let mut page = 1u32;

    loop {
        let mut page_url = url.clone();
        page_url
            .query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &PER_PAGE.to_string());

        let bytes = fetch_bytes(client, &page_url, retry).await?;
        let parsed: Page<T> = parse_page(&bytes).map_err(|source| ApiError::Malformed {
            url: page_url.to_string(),
            source,
        })?;

        let received = parsed.data.len();
        all.extend(parsed.data);
        debug!(page, received, total = all.len(), "Page fetched");

        if received == 0 || !parsed.meta.has_next() {
            break;
        }
        page += 1;
    }

    Ok(all)
}
