//! FullText - full-text retrieval engine
//!
//! Given a web page URL, fetches the document, decides whether it is
//! text, and extracts its main readable content while discarding
//! navigation, ads and other boilerplate.
//!
//! ## Pipeline
//!
//! - [`Fetcher`] - network retrieval with timeout, redirect bound, body cap
//!   and one retry for transient failures ([`HttpFetcher`] is the default)
//! - [`classify`] - MIME category and charset decoding
//! - [`extract`](extract::extract) - density-based main content extraction
//! - [`RetrievalService`] - normalization, caching and error translation
//!   behind the single [`get_full_text`](RetrievalService::get_full_text)
//!   operation
//!
//! ```no_run
//! # async fn run() -> Result<(), fulltext::RetrievalError> {
//! let service = fulltext::RetrievalService::builder().build()?;
//! let outcome = service.get_full_text("https://example.com/article").await;
//! println!("{}", serde_json::to_string(&outcome.to_response()).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod cache;
pub mod classify;
mod config;
pub mod dom;
mod error;
pub mod extract;
pub mod fetchers;
pub mod normalize;
mod service;
mod types;

pub use cache::OutcomeCache;
pub use classify::{classify, parse_content_type};
pub use config::{
    RetrievalConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_MAX_REDIRECTS, DEFAULT_MIN_TEXT_DENSITY, DEFAULT_RETRY_BACKOFF, DEFAULT_TIMEOUT,
};
pub use error::{ErrorKind, RetrievalError};
pub use extract::{extract, ExtractOptions};
pub use fetchers::{Fetcher, HttpFetcher};
pub use normalize::normalize_url;
pub use service::{RetrievalService, ServiceBuilder};
pub use types::{
    ClassifiedDocument, ExtractionResult, Failure, FetchRequest, FetchResult, FullTextRequest,
    FullTextResponse, MimeCategory, Outcome,
};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "Everruns FullText/1.0";

/// Tool description for LLM consumption
pub const TOOL_DESCRIPTION: &str = r#"Retrieves a web page and returns its main readable text.

- Drops navigation, headers, footers, ads and scripts
- Returns the page title and content paragraphs in order
- Rejects binary content and pages without readable text
- Strict timeouts, bounded redirects and size limits"#;

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOL_LLMTXT: &str = r#"# FullText Tool (get_full_text)

Retrieves a web page and returns its main readable text, without markup or
boilerplate.

## Capabilities
- HTML, XHTML and plain text documents in any common charset
- Main content detection by text density (navigation, footers, sidebars,
  ads and scripts are dropped)
- Title detection from <title> or the top heading
- Redirects followed up to a limit
- Results cached per URL

## Input Parameters
- `url` (required): The URL to retrieve (must be http:// or https://)

## Output Fields
On success:
- `title`: Page title, empty if none was found
- `text`: Content paragraphs in document order

On failure:
- `error`: One of `invalid_url`, `timeout`, `too_many_redirects`,
  `not_found`, `upstream_error`, `unsupported_content_type`,
  `extraction_failed`, `internal_error`
- `detail`: Human-readable explanation

## Examples

### Retrieve an article
```json
{"url": "https://example.com/news/story"}
```

Response:
```json
{"title": "Story", "text": ["First paragraph.", "Second paragraph."]}
```

## Error Handling
- Invalid or blocked URLs return `invalid_url`
- 404 and 410 responses return `not_found`; other error statuses `upstream_error`
- Images, PDFs and other binary content return `unsupported_content_type`
- Pages with no readable text return `extraction_failed`
- Slow servers return `timeout` after one retry
"#;
