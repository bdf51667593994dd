//! # mailgate-crypto
//!
//! Cryptographic services used by the mailgate protocol engine.
//!
//! ## Features
//!
//! - **Symmetric ciphers**: AES-128 and 3DES-EDE in ECB and CBC modes with
//!   PKCS#7 padding
//! - **Key agreement**: X25519 ephemeral Diffie-Hellman
//! - **Digests**: SHA-256 rendered as upper-case hex (password storage)
//! - **Credentials**: random access tokens and per-message IVs
//!
//! The protocol engine only decides *when* these services run; this crate
//! decides *how*.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailgate_crypto::{Algorithm, BlockMode, Cipher, KeyPair};
//!
//! // Both sides generate an ephemeral key pair and swap public keys.
//! let ours = KeyPair::generate();
//! let theirs = KeyPair::generate();
//! let their_public = theirs.public_bytes();
//!
//! let secret = ours.agree(&their_public)?;
//! let cipher = Cipher::new(Algorithm::Aes, BlockMode::Cbc, secret.as_bytes())?;
//!
//! let sealed = cipher.seal(b"OK AUTH Completed")?;
//! let opened = cipher.open(sealed.iv(), sealed.ciphertext())?;
//! assert_eq!(opened, b"OK AUTH Completed");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod digest;
mod error;
pub mod key_exchange;
pub mod symmetric;
pub mod token;

pub use digest::digest_hex;
pub use error::{Error, Result};
pub use key_exchange::{KeyPair, PUBLIC_KEY_LEN, SharedSecret};
pub use symmetric::{Algorithm, BlockMode, Cipher, Sealed};
pub use token::mint_token;
