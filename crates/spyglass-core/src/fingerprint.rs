//! Content fingerprinting for canonical article resolution.
//!
//! The fingerprint is the dedup key of the article store: two submissions
//! with byte-identical normalized text produce the same fingerprint and
//! collapse onto one canonical row. The storage layer enforces this with a
//! UNIQUE constraint on the fingerprint column.

use sha2::{Digest, Sha256};

/// Digest scheme recorded inside the stored value, so the algorithm can be
/// rotated later without reinterpreting old rows.
const SCHEME: &str = "sha256";

/// Compute the content fingerprint of normalized article text.
///
/// SHA-256 over the UTF-8 bytes, rendered as `"sha256:<hex>"`. Pure and
/// deterministic: identical input always yields the identical digest, and
/// the empty string is a valid input with a well-defined digest.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}:{}", SCHEME, hex::encode(hasher.finalize()))
}
