//! Reserved and forbidden short code tokens.
//!
//! The blocklist covers three groups of lowercase tokens:
//!
//! - system routes that would collide with service endpoints
//! - brand names that must not be impersonated
//! - profanity
//!
//! Both predicates are pure functions over static data.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Path segments served by the service itself or reserved for future routes.
const SYSTEM_ROUTES: &[&str] = &[
    "admin",
    "api",
    "app",
    "assets",
    "auth",
    "dashboard",
    "docs",
    "favicon",
    "health",
    "help",
    "links",
    "login",
    "logout",
    "metrics",
    "register",
    "robots",
    "settings",
    "shorten",
    "signup",
    "static",
    "stats",
    "status",
    "support",
    "www",
];

const BRANDS: &[&str] = &[
    "amazon",
    "apple",
    "facebook",
    "github",
    "google",
    "instagram",
    "microsoft",
    "netflix",
    "paypal",
    "twitter",
    "youtube",
];

const PROFANITY: &[&str] = &[
    "asshole", "bastard", "bitch", "cunt", "dick", "fuck", "nigger", "porn", "pussy", "shit",
    "slut", "whore",
];

static BLOCKED_TOKENS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    SYSTEM_ROUTES
        .iter()
        .chain(BRANDS)
        .chain(PROFANITY)
        .copied()
        .collect()
});

/// Returns `true` if `code` is exactly a blocked token, ignoring case.
pub fn is_blocked_code(code: &str) -> bool {
    BLOCKED_TOKENS.contains(code.to_ascii_lowercase().as_str())
}

/// Returns `true` if any blocked token occurs inside `text`, ignoring case.
///
/// The empty string never matches.
pub fn contains_blocked_content(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    let lowered = text.to_ascii_lowercase();
    BLOCKED_TOKENS.iter().any(|token| lowered.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_is_blocked() {
        assert!(is_blocked_code("admin"));
        assert!(is_blocked_code("metrics"));
        assert!(is_blocked_code("google"));
    }

    #[test]
    fn test_exact_match_ignores_case() {
        assert!(is_blocked_code("ADMIN"));
        assert!(is_blocked_code("GoOgLe"));
    }

    #[test]
    fn test_exact_match_does_not_scan_substrings() {
        assert!(!is_blocked_code("myadmin"));
        assert!(!is_blocked_code("abc123X"));
    }

    #[test]
    fn test_substring_scan_finds_embedded_token() {
        assert!(contains_blocked_content("test-fuck-word"));
        assert!(contains_blocked_content("my-GOOGLE-page"));
    }

    #[test]
    fn test_substring_scan_passes_clean_text() {
        assert!(!contains_blocked_content("summer-sale-2025"));
        assert!(!contains_blocked_content("xyz"));
    }

    #[test]
    fn test_empty_string_never_matches() {
        assert!(!contains_blocked_content(""));
        assert!(!is_blocked_code(""));
    }

    #[test]
    fn test_all_tokens_are_lowercase() {
        for token in BLOCKED_TOKENS.iter() {
            assert_eq!(*token, token.to_ascii_lowercase());
        }
    }
}
