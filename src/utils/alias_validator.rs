//! Validation of custom aliases and system-generated short codes.
//!
//! Validation failures are expected, user-facing outcomes, so both entry
//! points return a [`ValidationResult`] instead of an error.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::utils::blocklist::{contains_blocked_content, is_blocked_code};
use crate::utils::code_generator::{ALPHABET, DEFAULT_CODE_LENGTH};

pub const MIN_ALIAS_LENGTH: usize = 3;
pub const MAX_ALIAS_LENGTH: usize = 30;

/// Alphanumeric at both ends, `-` and `_` allowed in between.
static ALIAS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9_-]*[A-Za-z0-9])?$").expect("alias pattern is valid")
});

/// Reason a code or alias was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Alias is too short: must be at least {min} characters")]
    TooShort { min: usize },

    #[error("Alias is too long: must be at most {max} characters")]
    TooLong { max: usize },

    #[error(
        "Alias contains invalid characters: use letters, digits, '-' or '_', starting and ending with a letter or digit"
    )]
    InvalidCharacters,

    #[error("Alias is reserved and cannot be used")]
    Reserved,

    #[error("Alias contains restricted content")]
    RestrictedContent,

    #[error("Short code must be exactly {expected} characters")]
    WrongLength { expected: usize },

    #[error("Short code may only contain letters and digits")]
    InvalidAlphabet,
}

/// Outcome of a validation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<ValidationError>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: ValidationError) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }

    /// Converts into a `Result`, for callers that propagate with `?`.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Validates a user-supplied custom alias.
///
/// # Rules
///
/// Checked in order, the first failure wins:
///
/// 1. At least 3 characters
/// 2. At most 30 characters
/// 3. Starts and ends with a letter or digit; `-` and `_` allowed inside
/// 4. Not a reserved token (case-insensitive)
/// 5. Does not contain a reserved token (case-insensitive)
///
/// # Examples
///
/// ```ignore
/// assert!(validate_custom_alias("spring-sale").valid);
/// assert!(!validate_custom_alias("ab").valid);         // Too short
/// assert!(!validate_custom_alias("-promo").valid);     // Starts with hyphen
/// assert!(!validate_custom_alias("ADMIN").valid);      // Reserved
/// ```
pub fn validate_custom_alias(alias: &str) -> ValidationResult {
    let length = alias.chars().count();

    if length < MIN_ALIAS_LENGTH {
        return ValidationResult::invalid(ValidationError::TooShort {
            min: MIN_ALIAS_LENGTH,
        });
    }

    if length > MAX_ALIAS_LENGTH {
        return ValidationResult::invalid(ValidationError::TooLong {
            max: MAX_ALIAS_LENGTH,
        });
    }

    if !ALIAS_REGEX.is_match(alias) {
        return ValidationResult::invalid(ValidationError::InvalidCharacters);
    }

    if is_blocked_code(alias) {
        return ValidationResult::invalid(ValidationError::Reserved);
    }

    if contains_blocked_content(alias) {
        return ValidationResult::invalid(ValidationError::RestrictedContent);
    }

    ValidationResult::ok()
}

/// Validates a system-generated short code.
///
/// Requires exactly [`DEFAULT_CODE_LENGTH`] Base62 characters and rejects
/// exact blocklist matches only.
pub fn validate_short_code(code: &str) -> ValidationResult {
    if code.len() != DEFAULT_CODE_LENGTH {
        return ValidationResult::invalid(ValidationError::WrongLength {
            expected: DEFAULT_CODE_LENGTH,
        });
    }

    if !code.bytes().all(|b| ALPHABET.contains(&b)) {
        return ValidationResult::invalid(ValidationError::InvalidAlphabet);
    }

    if is_blocked_code(code) {
        return ValidationResult::invalid(ValidationError::Reserved);
    }

    ValidationResult::ok()
}
