//! URL validation and normalization

use crate::error::RetrievalError;
use url::Url;

/// Parse and validate a target URL
///
/// Only absolute http/https URLs with a host are accepted.
pub fn parse_target_url(raw: &str) -> Result<Url, RetrievalError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RetrievalError::MissingUrl);
    }

    let url = Url::parse(raw).map_err(|e| RetrievalError::InvalidUrl(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RetrievalError::InvalidUrlScheme);
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(RetrievalError::InvalidUrl("URL has no host".to_string())),
    }
}

/// Normalize a URL for cache lookups
///
/// Parsing already lowercases the scheme and host and drops the default
/// port; on top of that the fragment and an empty query are removed.
/// Applying this to its own output yields the same string.
pub fn normalize_url(raw: &str) -> Result<Url, RetrievalError> {
    let mut url = parse_target_url(raw)?;
    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url)
}

/// Check a URL against allow/block prefix lists
///
/// An empty allow list allows everything; the block list always applies.
pub fn check_prefixes(
    url: &str,
    allow_prefixes: &[String],
    block_prefixes: &[String],
) -> Result<(), RetrievalError> {
    if !allow_prefixes.is_empty() && !allow_prefixes.iter().any(|p| url.starts_with(p)) {
        return Err(RetrievalError::BlockedUrl);
    }
    if block_prefixes.iter().any(|p| url.starts_with(p)) {
        return Err(RetrievalError::BlockedUrl);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_scheme_and_host() {
        let url = normalize_url("HTTP://Example.COM/Path").unwrap();
        assert_eq!(url.as_str(), "http://example.com/Path");
    }

    #[test]
    fn test_normalize_drops_default_port() {
        assert_eq!(
            normalize_url("http://example.com:80/a").unwrap().as_str(),
            "http://example.com/a"
        );
        assert_eq!(
            normalize_url("https://example.com:443/a").unwrap().as_str(),
            "https://example.com/a"
        );
        assert_eq!(
            normalize_url("https://example.com:8443/a").unwrap().as_str(),
            "https://example.com:8443/a"
        );
    }

    #[test]
    fn test_normalize_strips_fragment_and_empty_query() {
        assert_eq!(
            normalize_url("https://example.com/a?#section").unwrap().as_str(),
            "https://example.com/a"
        );
        assert_eq!(
            normalize_url("https://example.com/a?q=1#x").unwrap().as_str(),
            "https://example.com/a?q=1"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "HTTPS://Example.com:443/Some/Path?b=2&a=1#frag",
            "http://example.com",
            "http://example.com:8080/?",
            "https://user@EXAMPLE.org/x/../y/./z#",
            "http://[::1]:80/ipv6",
        ];
        for input in inputs {
            let once = normalize_url(input).unwrap();
            let twice = normalize_url(once.as_str()).unwrap();
            assert_eq!(once, twice, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            normalize_url(""),
            Err(RetrievalError::MissingUrl)
        ));
        assert!(matches!(
            normalize_url("ftp://example.com/file"),
            Err(RetrievalError::InvalidUrlScheme)
        ));
        assert!(matches!(
            normalize_url("not a url"),
            Err(RetrievalError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_url("mailto:someone@example.com"),
            Err(RetrievalError::InvalidUrlScheme)
        ));
    }

    #[test]
    fn test_check_prefixes() {
        let allow = vec!["https://allowed.com".to_string()];
        let block = vec!["https://allowed.com/private".to_string()];
        assert!(check_prefixes("https://allowed.com/page", &allow, &block).is_ok());
        assert!(check_prefixes("https://other.com/page", &allow, &block).is_err());
        assert!(check_prefixes("https://allowed.com/private/x", &allow, &block).is_err());
        assert!(check_prefixes("https://any.com/", &[], &[]).is_ok());
    }
}
