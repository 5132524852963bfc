use crate::UrlError;
use sha2::{Digest, Sha256};
use url::Url;

/// Normalizes a URL for deduplication
///
/// Two URLs that normalize identically are treated as the same page and
/// fetched at most once per job. Normalization must not change what is
/// actually requested, so it only removes parts with no fetch semantics:
///
/// 1. Parse the URL; reject if malformed or non-HTTP(S)
/// 2. Lowercase the host
/// 3. Empty path becomes /
/// 4. Remove the fragment
/// 5. Sort raw query segments (never re-encoded, only reordered)
/// 6. Remove an empty query string (trailing ?)
///
/// # Examples
///
/// ```
/// use rowcrawl::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/page?b=2&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .ok_or(UrlError::MissingHost)?
        .to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    if let Some(query) = url.query().map(str::to_string) {
        // Sort raw key=value segments; reordering is safe, re-encoding is not
        let mut segments: Vec<&str> = query.split('&').filter(|s| !s.is_empty()).collect();
        segments.sort_unstable();
        if segments.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&segments.join("&")));
        }
    }

    Ok(url)
}

/// Computes the dedup fingerprint of a normalized URL
///
/// SHA-256 over the normalized string, hex-encoded. This is the key stored
/// in the frontier's seen-set and in the job directory's seen file.
pub fn fingerprint(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
