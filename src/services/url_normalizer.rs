//! URL normalization.
//!
//! The normalized form is the de-duplication key for bookmarks, so two URLs that
//! differ only in host case, fragment, or a trailing path slash map to the same
//! stored string.

use url::Url;

use crate::types::errors::UrlError;

/// Canonicalizes `raw` into the form bookmarks are stored under.
///
/// 1. Trim surrounding whitespace.
/// 2. Parse as an absolute URL (a scheme is required).
/// 3. Lower-case the host. Scheme, path and query keep their case.
/// 4. Drop the fragment.
/// 5. Drop the trailing `/` of a non-root path.
///
/// # Errors
/// Returns `UrlError::InvalidUrl` when the trimmed input is not an absolute URL.
pub fn normalize(raw: &str) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    let mut parsed =
        Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    // Special schemes (http, https, ...) already come back lower-cased; opaque
    // hosts of other schemes do not.
    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            parsed
                .set_host(Some(&lowered))
                .map_err(|e| UrlError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
        }
    }

    parsed.set_fragment(None);

    if !parsed.cannot_be_a_base() {
        let path = parsed.path();
        if path.len() > 1 && path.ends_with('/') {
            // Stripping every trailing slash keeps normalize idempotent for
            // paths such as "/a//"; for the common single slash it is the same
            // as removing one.
            let stripped = path.trim_end_matches('/');
            let stripped = if stripped.is_empty() { "/" } else { stripped }.to_string();
            parsed.set_path(&stripped);
        }
    }

    Ok(parsed.to_string())
}

/// Returns `true` if `raw` normalizes successfully.
pub fn is_valid(raw: &str) -> bool {
    normalize(raw).is_ok()
}
