//! Content hashing
//!
//! Single place the digest algorithm is chosen. Current algorithm: SHA-256.

use sha2::{Digest, Sha256};

/// 32-byte digest of `data`
pub fn hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lowercase hex digest, for logs and audit records
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash(data))
}
