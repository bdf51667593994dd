//! Error types for cryptographic operations.

use crate::symmetric::Algorithm;

/// Result type alias for cryptographic operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Cryptographic error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The key material is shorter than the algorithm requires.
    #[error("{algorithm} needs a {expected}-byte key, got {actual} bytes")]
    InvalidKeyLength {
        /// Algorithm the key was meant for.
        algorithm: Algorithm,
        /// Required key length in bytes.
        expected: usize,
        /// Length of the supplied material.
        actual: usize,
    },

    /// The IV does not match the algorithm's block size.
    #[error("invalid IV length: expected {expected} bytes, got {actual}")]
    InvalidIvLength {
        /// Block size of the algorithm.
        expected: usize,
        /// Length of the supplied IV.
        actual: usize,
    },

    /// CBC decryption was attempted without an IV.
    #[error("CBC mode requires an IV")]
    MissingIv,

    /// Ciphertext could not be decrypted (bad padding or wrong key).
    #[error("decryption failed: bad padding or wrong key")]
    Decrypt,

    /// The peer's public key has the wrong size.
    #[error("invalid peer public key: expected 32 bytes, got {0}")]
    InvalidPublicKey(usize),

    /// The peer sent a low-order point, so the secret carries no entropy.
    #[error("key agreement produced a non-contributory secret")]
    NonContributory,
}
