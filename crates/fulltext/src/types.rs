//! Core types for FullText

use crate::error::{ErrorKind, RetrievalError};
use crate::normalize::parse_target_url;
use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Request to fetch a URL
///
/// Validated on construction; the target cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: Url,
    timeout: Option<Duration>,
    max_bytes: Option<usize>,
}

impl FetchRequest {
    /// Create a request for an absolute http(s) URL
    pub fn new(url: impl AsRef<str>) -> Result<Self, RetrievalError> {
        Ok(Self::from_url(parse_target_url(url.as_ref())?))
    }

    pub(crate) fn from_url(url: Url) -> Self {
        Self {
            url,
            timeout: None,
            max_bytes: None,
        }
    }

    /// Override the fetcher's default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the fetcher's default body size cap
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }
}

/// Raw result of a fetch, before classification
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL the body was served from, after redirects
    pub final_url: Url,
    /// Redirect targets followed, in order
    pub redirects: Vec<Url>,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Charset parameter of the Content-Type header
    pub charset: Option<String>,
    /// Body bytes, at most the configured cap
    pub body: Bytes,
    /// True if the body was cut at the cap or by a stream error
    pub truncated: bool,
}

impl FetchResult {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Broad kind of a fetched document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeCategory {
    /// HTML, XHTML or XML markup
    Html,
    /// Any other text
    PlainText,
    /// Binary or unknown
    Unsupported,
}

/// Fetched document with its decoded text
#[derive(Debug, Clone)]
pub struct ClassifiedDocument {
    pub result: FetchResult,
    pub category: MimeCategory,
    /// Name of the encoding the text was decoded with
    pub encoding: &'static str,
    /// Decoded text; empty when unsupported
    pub text: String,
    /// Why the document is unsupported
    pub reason: Option<String>,
}

/// Main content extracted from a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionResult {
    /// Document title if one was found
    pub title: Option<String>,
    /// Content blocks in document order, plain text
    pub blocks: Vec<String>,
    /// How much of the document the selection covers, 0.0 to 1.0
    pub confidence: f64,
}

/// Typed failure returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Failure {
    pub kind: ErrorKind,
    /// Human-readable detail, never internal state
    pub detail: String,
}

/// Result of a full-text retrieval
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ExtractionResult),
    Failure(Failure),
}

impl Outcome {
    /// Build a failure outcome for an error
    pub fn failure(err: &RetrievalError) -> Self {
        let kind = err.kind();
        let detail = match kind {
            ErrorKind::InternalError => "An internal error occurred".to_string(),
            _ => err.to_string(),
        };
        Outcome::Failure(Failure { kind, detail })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Failure kind, if any
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(failure) => Some(failure.kind),
        }
    }

    /// HTTP status an endpoint should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            Outcome::Success(_) => 200,
            Outcome::Failure(failure) => failure.kind.http_status(),
        }
    }

    /// Caller-facing JSON body
    pub fn to_response(&self) -> FullTextResponse {
        FullTextResponse::from(self)
    }
}

/// Input of the get-full-text operation
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FullTextRequest {
    /// The URL to retrieve (required, must be http:// or https://)
    pub url: String,
}

impl FullTextRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Caller-facing JSON body of the get-full-text operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FullTextResponse {
    Success {
        /// Document title, empty if none was found
        title: String,
        /// Content blocks in document order
        text: Vec<String>,
    },
    Failure {
        /// Failure kind
        error: ErrorKind,
        /// Human-readable detail
        detail: String,
    },
}

impl From<&Outcome> for FullTextResponse {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success(result) => FullTextResponse::Success {
                title: result.title.clone().unwrap_or_default(),
                text: result.blocks.clone(),
            },
            Outcome::Failure(failure) => FullTextResponse::Failure {
                error: failure.kind,
                detail: failure.detail.clone(),
            },
        }
    }
}
