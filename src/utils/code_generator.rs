//! Short code generation.
//!
//! Provides cryptographically secure random code synthesis over the Base62
//! alphabet, a positional Base62 codec, and collision-checked generation of
//! unique codes against the link store.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::RepositoryError;
use crate::utils::blocklist::is_blocked_code;

/// Base62 alphabet: digits, then uppercase, then lowercase.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of system-generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// Attempts made by [`generate_unique_code`] before giving up.
pub const MAX_RETRIES: u32 = 5;

/// Errors raised while generating or decoding short codes.
#[derive(Debug, Error)]
pub enum CodeGenError {
    #[error("code length must be at least 1")]
    InvalidLength,

    #[error("system randomness unavailable: {0}")]
    Entropy(getrandom::Error),

    #[error(
        "failed to generate a unique code after {attempts} attempts; increase code length or retry later"
    )]
    CollisionExhausted { attempts: u32 },

    #[error("existence check failed: {0}")]
    ExistenceCheck(#[from] RepositoryError),

    #[error("invalid base62 input: {0}")]
    InvalidBase62(String),
}

/// Generates a random code of exactly `length` characters.
///
/// Each character is one OS-random byte reduced with `byte % 62`. Since 256
/// is not a multiple of 62, the first 8 symbols of [`ALPHABET`] are drawn
/// with probability 5/256 instead of 4/256. The bias is kept so that the
/// code distribution stays identical to previously issued codes.
///
/// # Errors
///
/// Returns [`CodeGenError::InvalidLength`] for `length == 0` and
/// [`CodeGenError::Entropy`] if the OS random source fails.
pub fn generate_random_code(length: usize) -> Result<String, CodeGenError> {
    if length == 0 {
        return Err(CodeGenError::InvalidLength);
    }

    let mut buffer = vec![0u8; length];
    getrandom::fill(&mut buffer).map_err(CodeGenError::Entropy)?;

    Ok(buffer
        .iter()
        .map(|byte| ALPHABET[(*byte % 62) as usize] as char)
        .collect())
}

/// Encodes `n` as a positional Base62 numeral.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(encode_base62(0), "0");
/// assert_eq!(encode_base62(61), "z");
/// assert_eq!(encode_base62(62), "10");
/// ```
pub fn encode_base62(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 62) as usize]);
        n /= 62;
    }
    digits.reverse();

    // Every byte comes from ALPHABET, which is ASCII.
    digits.into_iter().map(char::from).collect()
}

/// Decodes a Base62 numeral produced by [`encode_base62`].
///
/// # Errors
///
/// Returns [`CodeGenError::InvalidBase62`] for empty input, characters
/// outside [`ALPHABET`], or values that overflow `u64`.
pub fn decode_base62(input: &str) -> Result<u64, CodeGenError> {
    if input.is_empty() {
        return Err(CodeGenError::InvalidBase62("empty input".to_string()));
    }

    input.bytes().try_fold(0u64, |acc, byte| {
        let digit = alphabet_index(byte).ok_or_else(|| {
            CodeGenError::InvalidBase62(format!("unexpected character {:?}", byte as char))
        })?;

        acc.checked_mul(62)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| CodeGenError::InvalidBase62(format!("{input} overflows u64")))
    })
}

fn alphabet_index(byte: u8) -> Option<u64> {
    match byte {
        b'0'..=b'9' => Some((byte - b'0') as u64),
        b'A'..=b'Z' => Some((byte - b'A') as u64 + 10),
        b'a'..=b'z' => Some((byte - b'a') as u64 + 36),
        _ => None,
    }
}

/// Generates a code that is neither blocklisted nor already taken.
///
/// Each of the [`MAX_RETRIES`] attempts draws a candidate. Blocklisted
/// candidates are discarded locally without consulting `exists_check`;
/// otherwise `exists_check` is awaited once and a `false` answer returns the
/// candidate. Checks are strictly sequential.
///
/// # Errors
///
/// - [`CodeGenError::CollisionExhausted`] after [`MAX_RETRIES`] attempts
/// - [`CodeGenError::ExistenceCheck`] if `exists_check` fails
/// - any error from [`generate_random_code`]
pub async fn generate_unique_code<F, Fut>(
    mut exists_check: F,
    length: usize,
) -> Result<String, CodeGenError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, RepositoryError>>,
{
    for attempt in 1..=MAX_RETRIES {
        let candidate = generate_random_code(length)?;

        if is_blocked_code(&candidate) {
            debug!(attempt, "Discarding blocklisted candidate");
            continue;
        }

        if !exists_check(candidate.clone()).await? {
            return Ok(candidate);
        }

        debug!(attempt, code = %candidate, "Short code collision");
    }

    warn!(
        attempts = MAX_RETRIES,
        length, "Exhausted short code generation attempts"
    );

    Err(CodeGenError::CollisionExhausted {
        attempts: MAX_RETRIES,
    })
}
