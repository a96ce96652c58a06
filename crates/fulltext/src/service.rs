//! Retrieval service: the get-full-text operation
//!
//! Drives URL normalization, the cache, the fetcher, status policy,
//! classification and extraction, and turns every failure into an
//! [`Outcome`]. Nothing escapes as a panic or an error.

use crate::cache::OutcomeCache;
use crate::classify::classify;
use crate::config::RetrievalConfig;
use crate::error::{ErrorKind, RetrievalError};
use crate::extract::{extract, ExtractOptions};
use crate::fetchers::{Fetcher, HttpFetcher};
use crate::normalize::{check_prefixes, normalize_url};
use crate::types::{ExtractionResult, FetchRequest, FullTextRequest, FullTextResponse, Outcome};
use crate::{TOOL_DESCRIPTION, TOOL_LLMTXT};
use futures::FutureExt;
use schemars::schema_for;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// Builder for a [`RetrievalService`]
#[derive(Clone, Default)]
pub struct ServiceBuilder {
    config: RetrievalConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl ServiceBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the wall-clock budget of one fetch attempt
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the number of redirects followed
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    /// Set the body size cap in bytes
    pub fn max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.config.max_body_bytes = max_body_bytes;
        self
    }

    /// Set the lifetime of cached outcomes
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = Some(ttl);
        self
    }

    /// Disable the outcome cache
    pub fn disable_cache(mut self) -> Self {
        self.config.cache_ttl = None;
        self
    }

    /// Set the maximum number of cached outcomes
    pub fn cache_capacity(mut self, capacity: u64) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Set the minimum text density of extracted content
    pub fn min_text_density(mut self, density: f64) -> Self {
        self.config.min_text_density = density;
        self
    }

    /// Set the pause before retrying a transient failure
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.retry_backoff = backoff;
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = Some(ua.into());
        self
    }

    /// Add URL prefix to allow list
    pub fn allow_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.allow_prefixes.push(prefix.into());
        self
    }

    /// Add URL prefix to block list
    pub fn block_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.block_prefixes.push(prefix.into());
        self
    }

    /// Use a custom fetcher instead of [`HttpFetcher`]
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Build the service
    ///
    /// Fails only if the HTTP client cannot be created.
    pub fn build(self) -> Result<RetrievalService, RetrievalError> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&self.config)?),
        };
        let cache = match self.config.cache_ttl {
            Some(ttl) if self.config.cache_capacity > 0 => {
                Some(OutcomeCache::new(self.config.cache_capacity, ttl))
            }
            _ => None,
        };

        Ok(RetrievalService {
            fetcher,
            cache,
            config: Arc::new(self.config),
        })
    }
}

/// Full-text retrieval service
///
/// Cheap to clone; clones share the fetcher, its connection pool and the
/// cache. Any number of calls may run concurrently.
#[derive(Clone)]
pub struct RetrievalService {
    fetcher: Arc<dyn Fetcher>,
    cache: Option<OutcomeCache>,
    config: Arc<RetrievalConfig>,
}

impl RetrievalService {
    /// Create a service builder
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    /// Create a service with default configuration
    pub fn new() -> Result<Self, RetrievalError> {
        ServiceBuilder::new().build()
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&OutcomeCache> {
        self.cache.as_ref()
    }

    /// Get tool description
    pub fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }

    /// Get full documentation (llmtxt)
    pub fn llmtxt(&self) -> &'static str {
        TOOL_LLMTXT
    }

    /// Get input schema as JSON
    pub fn input_schema(&self) -> serde_json::Value {
        let schema = schema_for!(FullTextRequest);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Get output schema as JSON
    pub fn output_schema(&self) -> serde_json::Value {
        let schema = schema_for!(FullTextResponse);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Retrieve a URL and extract its main text
    ///
    /// Successful outcomes are cached under the normalized URL; failures
    /// are not cached.
    pub async fn get_full_text(&self, url: &str) -> Outcome {
        let target = match self.validate(url) {
            Ok(target) => target,
            Err(err) => return self.fail(url, err),
        };

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(target.as_str()).await {
                debug!(url = %target, "Cache hit");
                return hit;
            }
        }

        let result = AssertUnwindSafe(self.retrieve(target.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(RetrievalError::Internal(panic_message(panic))));

        match result {
            Ok(extraction) => {
                debug!(
                    url = %target,
                    blocks = extraction.blocks.len(),
                    confidence = extraction.confidence,
                    "Extracted full text"
                );
                let outcome = Outcome::Success(extraction);
                if let Some(cache) = &self.cache {
                    cache.insert(target.to_string(), outcome.clone()).await;
                }
                outcome
            }
            Err(err) => self.fail(target.as_str(), err),
        }
    }

    fn validate(&self, url: &str) -> Result<Url, RetrievalError> {
        let target = normalize_url(url)?;
        check_prefixes(
            target.as_str(),
            &self.config.allow_prefixes,
            &self.config.block_prefixes,
        )?;
        Ok(target)
    }

    async fn retrieve(&self, url: Url) -> Result<ExtractionResult, RetrievalError> {
        let request = FetchRequest::from_url(url);
        let fetched = self.fetcher.fetch(&request).await?;
        debug!(
            url = %fetched.final_url,
            status = fetched.status,
            bytes = fetched.body.len(),
            redirects = fetched.redirects.len(),
            fetcher = self.fetcher.name(),
            "Fetched"
        );

        if !fetched.is_success() {
            return Err(RetrievalError::UpstreamStatus(fetched.status));
        }

        let options = ExtractOptions {
            min_text_density: self.config.min_text_density,
        };
        tokio::task::spawn_blocking(move || {
            let document = classify(fetched);
            extract(&document, &options)
        })
        .await
        .map_err(|e| RetrievalError::Internal(format!("extraction task failed: {e}")))?
    }

    fn fail(&self, url: &str, err: RetrievalError) -> Outcome {
        let kind = err.kind();
        if kind == ErrorKind::InternalError {
            error!(url = %url, error = %err, "Internal error");
        } else {
            warn!(url = %url, kind = %kind, error = %err, "Retrieval failed");
        }
        Outcome::failure(&err)
    }
}

impl std::fmt::Debug for RetrievalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalService")
            .field("fetcher", &self.fetcher.name())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}
