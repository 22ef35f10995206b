//! Request identity and cache key generation.

use sha2::{Digest, Sha256};

/// Canonical form of a request URL for matching.
///
/// Lowercases the scheme and host and drops the fragment. Strings that are
/// not absolute URLs are returned trimmed but otherwise untouched.
pub fn canonical_url(input: &str) -> String {
    let trimmed = input.trim();
    match url::Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Compute the cache key for a request: SHA-256 over method and canonical URL.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical_url(url).as_bytes());
    hex::encode(hasher.finalize())
}
