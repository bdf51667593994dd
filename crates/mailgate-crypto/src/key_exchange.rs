//! Ephemeral X25519 key agreement.
//!
//! Each side generates a [`KeyPair`], sends its 32-byte public key in one
//! frame and feeds the peer's frame into [`KeyPair::agree`]. The resulting
//! [`SharedSecret`] is the key material for [`crate::Cipher::new`].

use std::fmt;

use x25519_dalek::{EphemeralSecret, PublicKey};

use crate::error::{Error, Result};

/// Length of an encoded public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// One-shot key pair. Consumed by [`KeyPair::agree`].
pub struct KeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generates a fresh key pair from the OS random source.
    #[must_use]
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(rand::rngs::OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Returns the encoded public key to send to the peer.
    #[must_use]
    pub fn public_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        *self.public.as_bytes()
    }

    /// Completes the agreement with the peer's encoded public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the peer key is not 32 bytes, or if it is a
    /// low-order point that yields an all-zero secret.
    pub fn agree(self, peer: &[u8]) -> Result<SharedSecret> {
        let bytes: [u8; PUBLIC_KEY_LEN] = peer
            .try_into()
            .map_err(|_| Error::InvalidPublicKey(peer.len()))?;
        let shared = self.secret.diffie_hellman(&PublicKey::from(bytes));
        if !shared.was_contributory() {
            return Err(Error::NonContributory);
        }
        Ok(SharedSecret(*shared.as_bytes()))
    }
}

/// Agreed secret, identical on both ends.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Returns the raw secret bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}
