//! Fetcher system for network retrieval
//!
//! Design: the retrieval service only sees the [`Fetcher`] trait, so the
//! pipeline can run against any source of [`FetchResult`]s. [`HttpFetcher`]
//! is the production implementation.

mod http;

pub use http::HttpFetcher;

use crate::error::RetrievalError;
use crate::types::{FetchRequest, FetchResult};
use async_trait::async_trait;

/// Trait for document fetchers
///
/// Implementations own detection of their own failure modes (timeouts,
/// redirect limits) and report them as [`RetrievalError`]s. Non-success
/// HTTP statuses are not errors at this level; they are returned in the
/// [`FetchResult`] so the caller can apply its own policy.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Unique identifier for this fetcher (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Fetch the document behind the request URL
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, RetrievalError>;
}
