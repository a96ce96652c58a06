//! HTTP fetcher
//!
//! Follows redirects by hand so hops can be counted and cycles detected,
//! bounds every attempt by a wall-clock timeout, caps the body size and
//! retries transient failures once.

use crate::classify::parse_content_type;
use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use crate::fetchers::Fetcher;
use crate::types::{FetchRequest, FetchResult};
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Statuses worth one more attempt
const RETRYABLE_STATUSES: &[u16] = &[429, 503];

const ACCEPT_VALUE: &str = "text/html, application/xhtml+xml, text/plain;q=0.9, */*;q=0.8";

/// HTTP/HTTPS fetcher
///
/// Holds one `reqwest::Client`, so connections are pooled for the lifetime
/// of the fetcher. Dropping a pending `fetch` future closes its connection.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_redirects: usize,
    max_body_bytes: usize,
    retry_backoff: Duration,
}

impl HttpFetcher {
    /// Create a fetcher from the retrieval configuration
    pub fn new(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let mut headers = HeaderMap::new();
        let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.timeout)
            .redirect(Policy::none())
            .build()
            .map_err(RetrievalError::ClientBuildError)?;

        Ok(Self {
            client,
            timeout: config.timeout,
            max_redirects: config.max_redirects,
            max_body_bytes: config.max_body_bytes,
            retry_backoff: config.retry_backoff,
        })
    }

    /// One attempt, bounded by `timeout` from connect to last body byte
    async fn fetch_once(
        &self,
        url: &Url,
        timeout: Duration,
        max_bytes: usize,
    ) -> Result<FetchResult, RetrievalError> {
        tokio::time::timeout(timeout, self.follow_redirects(url, timeout, max_bytes))
            .await
            .map_err(|_| RetrievalError::Timeout(timeout))?
    }

    async fn follow_redirects(
        &self,
        url: &Url,
        timeout: Duration,
        max_bytes: usize,
    ) -> Result<FetchResult, RetrievalError> {
        let mut current = url.clone();
        let mut redirects = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(without_fragment(&current));

        loop {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| RetrievalError::from_reqwest(e, timeout))?;

            let status = response.status();
            if status.is_redirection() {
                if let Some(location) = response.headers().get(LOCATION) {
                    let next = resolve_location(&current, location)?;
                    if redirects.len() >= self.max_redirects {
                        return Err(RetrievalError::TooManyRedirects {
                            limit: self.max_redirects,
                        });
                    }
                    if !visited.insert(without_fragment(&next)) {
                        return Err(RetrievalError::RedirectLoop(next.to_string()));
                    }
                    debug!(from = %current, to = %next, status = status.as_u16(), "Following redirect");
                    redirects.push(next.clone());
                    current = next;
                    continue;
                }
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let charset = content_type
                .as_deref()
                .and_then(|ct| parse_content_type(ct).1);

            let (body, truncated) = read_body_capped(response, max_bytes).await?;
            if truncated {
                warn!(url = %current, bytes = body.len(), "Response body truncated");
            }

            return Ok(FetchResult {
                final_url: current,
                redirects,
                status: status.as_u16(),
                content_type,
                charset,
                body,
                truncated,
            });
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, RetrievalError> {
        let timeout = request.timeout().unwrap_or(self.timeout);
        let max_bytes = request.max_bytes().unwrap_or(self.max_body_bytes);
        let url = request.url();

        match self.fetch_once(url, timeout, max_bytes).await {
            Ok(result) if RETRYABLE_STATUSES.contains(&result.status) => {
                warn!(url = %url, status = result.status, "Transient status, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.fetch_once(url, timeout, max_bytes).await
            }
            Err(RetrievalError::Timeout(_)) => {
                warn!(url = %url, "Fetch timed out, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.fetch_once(url, timeout, max_bytes).await
            }
            other => other,
        }
    }
}

/// Resolve a Location header against the URL that returned it
fn resolve_location(base: &Url, location: &HeaderValue) -> Result<Url, RetrievalError> {
    let location = location
        .to_str()
        .map_err(|_| RetrievalError::BadRedirect("Location is not valid text".to_string()))?;
    let next = base
        .join(location.trim())
        .map_err(|e| RetrievalError::BadRedirect(format!("{location}: {e}")))?;
    if !matches!(next.scheme(), "http" | "https") {
        return Err(RetrievalError::BadRedirect(format!(
            "redirect to unsupported scheme {}",
            next.scheme()
        )));
    }
    Ok(next)
}

fn without_fragment(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

/// Read the response body, keeping at most `max_bytes`
///
/// Returns the bytes and whether the body was cut short. A stream error
/// after some bytes arrived keeps what was read; before any byte it fails.
async fn read_body_capped(
    response: reqwest::Response,
    max_bytes: usize,
) -> Result<(Bytes, bool), RetrievalError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                let room = max_bytes.saturating_sub(body.len());
                if bytes.len() > room {
                    body.extend_from_slice(&bytes[..room]);
                    return Ok((Bytes::from(body), true));
                }
                body.extend_from_slice(&bytes);
            }
            Err(e) if body.is_empty() => {
                return Err(RetrievalError::RequestError(format!(
                    "Failed to read response body: {e}"
                )));
            }
            Err(e) => {
                warn!("Error reading body chunk: {}", e);
                return Ok((Bytes::from(body), true));
            }
        }
    }

    Ok((Bytes::from(body), false))
}
