//! Short code generation.
//!
//! Codes are drawn from a fixed 62-symbol alphanumeric alphabet using the
//! operating system's cryptographically secure random source.
//!
//! # Distribution
//!
//! One random byte is consumed per output character and mapped with
//! `byte % 62`. Since 256 is not a multiple of 62, the first eight symbols
//! (`A`..=`H`) are picked with probability 5/256 instead of 4/256. Short codes
//! are identifiers, not secrets, so this bias is accepted.

/// Output alphabet: 26 uppercase letters, 26 lowercase letters, 10 digits.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Errors that can occur during code generation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("short code length must be positive, got {0}")]
    InvalidLength(usize),
}

/// Generates a random short code of exactly `length` characters.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidLength`] if `length` is zero.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
///
/// # Examples
///
/// ```ignore
/// let code = generate(6).unwrap();
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate(length: usize) -> Result<String, GenerateError> {
    if length == 0 {
        return Err(GenerateError::InvalidLength(length));
    }

    let mut buffer = vec![0u8; length];
    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    Ok(buffer
        .into_iter()
        .map(|byte| ALPHABET[usize::from(byte) % ALPHABET.len()] as char)
        .collect())
}

/// Returns true if `code` could have been produced by [`generate`].
///
/// Used to reject malformed path segments before touching the store.
pub fn is_well_formed(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| ALPHABET.contains(&b))
}
