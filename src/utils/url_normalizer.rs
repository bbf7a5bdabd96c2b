//! URL validation and scheme injection.
//!
//! Destinations are always stored with an explicit `http://` or `https://`
//! scheme. Input that carries one is stored verbatim; input without one gets
//! `https://` prepended.

use url::Url;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlNormalizationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must contain a host")]
    MissingHost,
}

/// Prepends `https://` unless `input` already starts with `http://` or
/// `https://` (case-insensitive). Surrounding whitespace is trimmed.
pub fn ensure_scheme(input: &str) -> String {
    let trimmed = input.trim();
    if has_web_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Validates `input` as an absolute web URL and returns the string to store.
///
/// # Rules
///
/// 1. **Scheme**: `http`/`https` are kept as written; a missing scheme becomes `https://`
/// 2. **Other schemes**: `javascript:`, `mailto:`, `ftp://`, ... are rejected
/// 3. **Host**: must be present
/// 4. **Control characters**: rejected (`Location` headers cannot carry them)
/// 5. **Text**: otherwise stored exactly as given (no re-serialisation)
///
/// # Errors
///
/// Returns [`UrlNormalizationError::Empty`] for blank input.
/// Returns [`UrlNormalizationError::UnsupportedProtocol`] for non-HTTP(S) schemes.
/// Returns [`UrlNormalizationError::InvalidFormat`] if the URL does not parse
/// or contains a control character.
/// Returns [`UrlNormalizationError::MissingHost`] if the URL has no host.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_url("example.com/a").unwrap(), "https://example.com/a");
/// assert_eq!(normalize_url("http://example.com").unwrap(), "http://example.com");
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }

    if trimmed.chars().any(char::is_control) {
        return Err(UrlNormalizationError::InvalidFormat(
            "URL must not contain control characters".to_string(),
        ));
    }

    if let Some(scheme) = scheme_prefix(trimmed) {
        if !is_web_scheme(scheme) {
            return Err(UrlNormalizationError::UnsupportedProtocol);
        }
    } else if has_foreign_scheme(trimmed) {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    let candidate = ensure_scheme(trimmed);

    let url =
        Url::parse(&candidate).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !is_web_scheme(url.scheme()) {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(candidate),
        _ => Err(UrlNormalizationError::MissingHost),
    }
}

fn is_web_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

fn has_web_scheme(input: &str) -> bool {
    scheme_prefix(input).is_some_and(is_web_scheme)
}

/// Returns the text before a leading `scheme://`.
///
/// A `://` that appears after the first `/`, `?` or `#` belongs to the path,
/// query or fragment (`example.com/?next=https://...`) and is ignored.
fn scheme_prefix(input: &str) -> Option<&str> {
    let (scheme, _) = input.split_once("://")?;
    (!scheme.contains(['/', '?', '#'])).then_some(scheme)
}

/// Detects scheme-only forms such as `mailto:x` or `javascript:...`.
///
/// `host:port` input (`localhost:3000`) parses as a scheme too, so a colon
/// followed by a digit or a dotted "scheme" is treated as a bare host.
fn has_foreign_scheme(input: &str) -> bool {
    let Ok(url) = Url::parse(input) else {
        return false;
    };

    let scheme = url.scheme();
    let rest = input.get(scheme.len() + 1..).unwrap_or_default();
    let looks_like_port = rest.chars().next().is_some_and(|c| c.is_ascii_digit());

    !is_web_scheme(scheme) && !scheme.contains('.') && !looks_like_port
}
