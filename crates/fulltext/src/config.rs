//! Retrieval configuration

use std::time::Duration;

/// Default wall-clock budget for one fetch attempt
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of redirects followed before giving up
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Default body size cap (10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Default lifetime of a cached outcome
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Default number of cached outcomes
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default minimum text density a block needs to count as content
pub const DEFAULT_MIN_TEXT_DENSITY: f64 = 10.0;

/// Default pause before retrying a transient failure
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Options consumed by the retrieval service, fixed at construction
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Budget for connect, redirects and full body read
    pub timeout: Duration,
    /// Redirects followed before failing
    pub max_redirects: usize,
    /// Body bytes kept; the rest is dropped and the result marked truncated
    pub max_body_bytes: usize,
    /// Lifetime of cached outcomes; `None` disables the cache
    pub cache_ttl: Option<Duration>,
    /// Maximum number of cached outcomes
    pub cache_capacity: u64,
    /// Minimum (plain chars / tags) a selected block must reach
    pub min_text_density: f64,
    /// Pause before the single retry of a transient failure
    pub retry_backoff: Duration,
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Allow list of URL prefixes
    pub allow_prefixes: Vec<String>,
    /// Block list of URL prefixes
    pub block_prefixes: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cache_ttl: Some(DEFAULT_CACHE_TTL),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            min_text_density: DEFAULT_MIN_TEXT_DENSITY,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            user_agent: None,
            allow_prefixes: Vec::new(),
            block_prefixes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(3600)));
        assert!(config.user_agent.is_none());
        assert!(config.allow_prefixes.is_empty());
        assert!(config.block_prefixes.is_empty());
    }
}
