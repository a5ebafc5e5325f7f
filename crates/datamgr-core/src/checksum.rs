//! SHA-256 hashing of downloaded files.
//!
//! Content is hashed once, right after download and before the cache entry
//! is written (trust-on-write). Cached reads never re-hash.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let digest = hasher.finalize();
    Ok(hex::encode(digest))
}

/// Canonical form of a user-supplied hex digest: trimmed, lowercase.
pub fn normalize_hash(hash: &str) -> String {
    hash.trim().to_ascii_lowercase()
}

/// True if `actual` (as produced by [`sha256_path`]) matches `expected`
/// after normalization.
pub fn hash_matches(expected: &str, actual: &str) -> bool {
    normalize_hash(expected) == normalize_hash(actual)
}
