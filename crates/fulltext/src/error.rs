//! Error types for FullText

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Caller-facing failure category of a retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// URL is missing, malformed, not http(s), or blocked by policy
    InvalidUrl,
    /// No complete response within the fetch timeout
    Timeout,
    /// Redirect limit exceeded or redirect cycle detected
    TooManyRedirects,
    /// Upstream answered 404 or 410
    NotFound,
    /// Upstream unreachable or answered with a non-success status
    UpstreamError,
    /// Content is not text-bearing markup or plain text
    UnsupportedContentType,
    /// No block of readable content cleared the density threshold
    ExtractionFailed,
    /// Unexpected fault inside the pipeline
    InternalError,
}

impl ErrorKind {
    /// Stable identifier used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::Timeout => "timeout",
            ErrorKind::TooManyRedirects => "too_many_redirects",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::UnsupportedContentType => "unsupported_content_type",
            ErrorKind::ExtractionFailed => "extraction_failed",
            ErrorKind::InternalError => "internal_error",
        }
    }

    /// HTTP status an endpoint should answer with for this failure
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::InvalidUrl => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::UnsupportedContentType => 415,
            ErrorKind::ExtractionFailed => 422,
            ErrorKind::InternalError => 500,
            ErrorKind::UpstreamError | ErrorKind::TooManyRedirects => 502,
            ErrorKind::Timeout => 504,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while retrieving full text
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// URL is missing
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// URL has invalid scheme
    #[error("Invalid URL: must start with http:// or https://")]
    InvalidUrlScheme,

    /// URL could not be parsed or has no host
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// URL is blocked by prefix list
    #[error("Blocked URL: prefix not allowed")]
    BlockedUrl,

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Connect, redirects and body read did not finish in time
    #[error("Request timed out: no complete response within {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Redirect chain longer than the configured limit
    #[error("Too many redirects: more than {limit} followed")]
    TooManyRedirects { limit: usize },

    /// Redirect chain revisits a URL
    #[error("Redirect loop detected at {0}")]
    RedirectLoop(String),

    /// Redirect response without a usable Location
    #[error("Invalid redirect from upstream: {0}")]
    BadRedirect(String),

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Upstream answered with a non-success status
    #[error("Upstream responded with HTTP {0}")]
    UpstreamStatus(u16),

    /// Content cannot be turned into text
    #[error("Unsupported content: {0}")]
    UnsupportedContentType(String),

    /// Nothing readable was found
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Unexpected fault; the message is logged, never shown to callers
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RetrievalError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            RetrievalError::Timeout(timeout)
        } else if err.is_connect() {
            RetrievalError::ConnectError(err)
        } else {
            RetrievalError::RequestError(err.to_string())
        }
    }

    /// Failure category reported to callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            RetrievalError::MissingUrl
            | RetrievalError::InvalidUrlScheme
            | RetrievalError::InvalidUrl(_)
            | RetrievalError::BlockedUrl => ErrorKind::InvalidUrl,
            RetrievalError::Timeout(_) => ErrorKind::Timeout,
            RetrievalError::TooManyRedirects { .. } | RetrievalError::RedirectLoop(_) => {
                ErrorKind::TooManyRedirects
            }
            RetrievalError::UpstreamStatus(404 | 410) => ErrorKind::NotFound,
            RetrievalError::UpstreamStatus(_)
            | RetrievalError::BadRedirect(_)
            | RetrievalError::ConnectError(_)
            | RetrievalError::RequestError(_) => ErrorKind::UpstreamError,
            RetrievalError::UnsupportedContentType(_) => ErrorKind::UnsupportedContentType,
            RetrievalError::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
            RetrievalError::ClientBuildError(_) | RetrievalError::Internal(_) => {
                ErrorKind::InternalError
            }
        }
    }
}
