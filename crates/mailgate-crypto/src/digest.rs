//! SHA-256 digests for credential storage.
//!
//! Passwords never reach the store in clear text; only the digest produced
//! here is persisted and compared.

use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of `input` as 64 upper-case hex characters.
#[must_use]
pub fn digest_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode_upper(hasher.finalize())
}
