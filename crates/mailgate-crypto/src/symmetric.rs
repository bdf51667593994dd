//! Symmetric ciphers for the secure channel.
//!
//! A [`Cipher`] binds an [`Algorithm`] and a [`BlockMode`] to key material
//! taken from the key agreement. Every CBC encryption draws a fresh random
//! IV, which travels next to the ciphertext in a [`Sealed`] value.

use std::fmt;

use aes::Aes128;
use cipher::block_padding::Pkcs7;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use des::TdesEde3;
use rand::RngCore;

use crate::error::{Error, Result};

/// Block cipher family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// AES with a 128-bit key.
    Aes,
    /// Triple DES (EDE, three keys).
    TripleDes,
}

impl Algorithm {
    /// Returns the cipher block size in bytes, which is also the IV size.
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Aes => 16,
            Self::TripleDes => 8,
        }
    }

    /// Returns the key length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes => 16,
            Self::TripleDes => 24,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes => write!(f, "AES"),
            Self::TripleDes => write!(f, "3DES"),
        }
    }
}

/// Block chaining mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockMode {
    /// Electronic codebook. No IV.
    Ecb,
    /// Cipher block chaining with a random IV per message.
    Cbc,
}

impl fmt::Display for BlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ecb => write!(f, "ECB"),
            Self::Cbc => write!(f, "CBC"),
        }
    }
}

/// Output of a single encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    iv: Option<Vec<u8>>,
    ciphertext: Vec<u8>,
}

impl Sealed {
    /// Returns the IV used, present only in CBC mode.
    #[must_use]
    pub fn iv(&self) -> Option<&[u8]> {
        self.iv.as_deref()
    }

    /// Returns the ciphertext.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Splits into IV and ciphertext.
    #[must_use]
    pub fn into_parts(self) -> (Option<Vec<u8>>, Vec<u8>) {
        (self.iv, self.ciphertext)
    }
}

/// A keyed block cipher in a fixed mode.
#[derive(Clone)]
pub struct Cipher {
    algorithm: Algorithm,
    mode: BlockMode,
    key: Vec<u8>,
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("algorithm", &self.algorithm)
            .field("mode", &self.mode)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Cipher {
    /// Creates a cipher from agreed key material.
    ///
    /// The key is the leading `algorithm.key_len()` bytes of `material`.
    ///
    /// # Errors
    ///
    /// Returns an error if `material` is shorter than the key length.
    pub fn new(algorithm: Algorithm, mode: BlockMode, material: &[u8]) -> Result<Self> {
        let expected = algorithm.key_len();
        let key = material.get(..expected).ok_or(Error::InvalidKeyLength {
            algorithm,
            expected,
            actual: material.len(),
        })?;

        Ok(Self {
            algorithm,
            mode,
            key: key.to_vec(),
        })
    }

    /// Returns the algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the block mode.
    #[must_use]
    pub const fn mode(&self) -> BlockMode {
        self.mode
    }

    /// Encrypts `plaintext`, drawing a fresh IV in CBC mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the cipher cannot be keyed.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Sealed> {
        match self.mode {
            BlockMode::Ecb => Ok(Sealed {
                iv: None,
                ciphertext: self.encrypt_ecb(plaintext)?,
            }),
            BlockMode::Cbc => {
                let iv = self.fresh_iv();
                let ciphertext = self.encrypt_with_iv(&iv, plaintext)?;
                Ok(Sealed {
                    iv: Some(iv),
                    ciphertext,
                })
            }
        }
    }

    /// Decrypts `ciphertext`. CBC mode requires `iv`; ECB ignores it.
    ///
    /// # Errors
    ///
    /// Returns an error if the IV is missing or malformed, or if the
    /// padding does not verify.
    pub fn open(&self, iv: Option<&[u8]>, ciphertext: &[u8]) -> Result<Vec<u8>> {
        match (self.mode, self.algorithm) {
            (BlockMode::Ecb, Algorithm::Aes) => ecb::Decryptor::<Aes128>::new_from_slice(&self.key)
                .map_err(|_| self.key_error())?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| Error::Decrypt),
            (BlockMode::Ecb, Algorithm::TripleDes) => {
                ecb::Decryptor::<TdesEde3>::new_from_slice(&self.key)
                    .map_err(|_| self.key_error())?
                    .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                    .map_err(|_| Error::Decrypt)
            }
            (BlockMode::Cbc, Algorithm::Aes) => {
                let iv = self.check_iv(iv)?;
                cbc::Decryptor::<Aes128>::new_from_slices(&self.key, iv)
                    .map_err(|_| self.key_error())?
                    .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                    .map_err(|_| Error::Decrypt)
            }
            (BlockMode::Cbc, Algorithm::TripleDes) => {
                let iv = self.check_iv(iv)?;
                cbc::Decryptor::<TdesEde3>::new_from_slices(&self.key, iv)
                    .map_err(|_| self.key_error())?
                    .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                    .map_err(|_| Error::Decrypt)
            }
        }
    }

    /// Encrypts in CBC mode under a caller-supplied IV.
    ///
    /// # Errors
    ///
    /// Returns an error if the IV length does not match the block size.
    pub fn encrypt_with_iv(&self, iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let iv = self.check_iv(Some(iv))?;
        let ciphertext = match self.algorithm {
            Algorithm::Aes => cbc::Encryptor::<Aes128>::new_from_slices(&self.key, iv)
                .map_err(|_| self.key_error())?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Algorithm::TripleDes => cbc::Encryptor::<TdesEde3>::new_from_slices(&self.key, iv)
                .map_err(|_| self.key_error())?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        };
        Ok(ciphertext)
    }

    fn encrypt_ecb(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let ciphertext = match self.algorithm {
            Algorithm::Aes => ecb::Encryptor::<Aes128>::new_from_slice(&self.key)
                .map_err(|_| self.key_error())?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Algorithm::TripleDes => ecb::Encryptor::<TdesEde3>::new_from_slice(&self.key)
                .map_err(|_| self.key_error())?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        };
        Ok(ciphertext)
    }

    fn fresh_iv(&self) -> Vec<u8> {
        let mut iv = vec![0u8; self.algorithm.block_size()];
        rand::thread_rng().fill_bytes(&mut iv);
        iv
    }

    fn check_iv<'a>(&self, iv: Option<&'a [u8]>) -> Result<&'a [u8]> {
        let iv = iv.ok_or(Error::MissingIv)?;
        let expected = self.algorithm.block_size();
        if iv.len() == expected {
            Ok(iv)
        } else {
            Err(Error::InvalidIvLength {
                expected,
                actual: iv.len(),
            })
        }
    }

    fn key_error(&self) -> Error {
        Error::InvalidKeyLength {
            algorithm: self.algorithm,
            expected: self.algorithm.key_len(),
            actual: self.key.len(),
        }
    }
}
