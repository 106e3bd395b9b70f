//! Destination URL normalization.
//!
//! Every stored destination goes through [`normalize_url`], so the same
//! target is always stored, cached, and redirected to in one canonical form.

use url::Url;

/// Longest destination accepted, in bytes, after normalization.
pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,

    #[error("URL is longer than {max} characters")]
    TooLong { max: usize },
}

/// Normalizes a destination URL to a canonical form.
///
/// # Normalization Rules
///
/// 1. Surrounding whitespace is trimmed
/// 2. Only `http` and `https` are accepted; `javascript:`, `data:`, `file:`
///    and friends are rejected
/// 3. A host is required; it is lowercased by the parser
/// 4. Default ports (80 / 443) and fragments are dropped
/// 5. Path and query are preserved as-is
///
/// # Errors
///
/// Returns an [`UrlNormalizationError`] describing the first rule violated.
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let mut url = Url::parse(input.trim())
        .map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlNormalizationError::MissingHost);
    }

    // The parser already lowercases the host and drops default ports.
    url.set_fragment(None);

    let normalized = String::from(url);
    if normalized.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong {
            max: MAX_URL_LENGTH,
        });
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_form() {
        let cases = [
            ("https://example.com", "https://example.com/"),
            ("  https://example.com/x  ", "https://example.com/x"),
            ("HTTPS://EXAMPLE.COM:443/Path?key=VALUE#anchor", "https://example.com/Path?key=VALUE"),
            ("http://example.com:80/path", "http://example.com/path"),
            ("http://example.com:8080/path", "http://example.com:8080/path"),
            ("https://example.com/search?q=rust&lang=en", "https://example.com/search?q=rust&lang=en"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_url(input).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn test_rejects_unsafe_schemes() {
        for input in [
            "javascript:alert('xss')",
            "data:text/plain,Hello",
            "file:///etc/passwd",
            "ftp://example.com/file.txt",
            "mailto:test@example.com",
        ] {
            assert!(
                matches!(
                    normalize_url(input),
                    Err(UrlNormalizationError::UnsupportedProtocol)
                ),
                "{input}"
            );
        }
    }

    #[test]
    fn test_rejects_malformed_input() {
        for input in ["", "not a valid url", "example.com"] {
            assert!(matches!(
                normalize_url(input),
                Err(UrlNormalizationError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn test_rejects_overlong_url() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(
            normalize_url(&url),
            Err(UrlNormalizationError::TooLong { .. })
        ));

        let fits = format!("https://example.com/{}", "a".repeat(100));
        assert!(normalize_url(&fits).is_ok());
    }
}
