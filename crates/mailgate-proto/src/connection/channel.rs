//! Secure channel.
//!
//! Wraps a [`FramedStream`] with the session's current cipher context.
//! The context is an immutable value; negotiation builds a new one and
//! swaps it in whole. Handshake frames always travel raw.
//!
//! | Mode      | Write                          | Read                      |
//! |-----------|--------------------------------|---------------------------|
//! | plaintext | one frame                      | one frame                 |
//! | ECB       | one ciphertext frame           | one frame, decrypt        |
//! | CBC       | IV frame, then ciphertext frame| IV frame, ciphertext frame|

#![allow(clippy::missing_errors_doc)]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mailgate_crypto::{Algorithm, BlockMode, Cipher, KeyPair};
use tokio::io::{AsyncRead, AsyncWrite};

use super::framed::FramedStream;
use crate::{Error, Result};

/// Negotiable cipher mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CipherMode {
    /// No encryption.
    #[default]
    Plain,
    /// AES-128 in ECB mode.
    AesEcb,
    /// AES-128 in CBC mode.
    AesCbc,
    /// 3DES-EDE in ECB mode.
    DesEcb,
    /// 3DES-EDE in CBC mode.
    DesCbc,
}

impl CipherMode {
    /// All modes, in the order AUTH documents them.
    pub const ALL: [Self; 5] = [
        Self::AesCbc,
        Self::AesEcb,
        Self::DesCbc,
        Self::DesEcb,
        Self::Plain,
    ];

    /// Parses an AUTH argument, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
    }

    /// Returns the wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::AesEcb => "AES/ECB",
            Self::AesCbc => "AES/CBC",
            Self::DesEcb => "DES/ECB",
            Self::DesCbc => "DES/CBC",
        }
    }

    /// Returns the algorithm and block mode, or `None` for plaintext.
    #[must_use]
    pub const fn cipher_spec(self) -> Option<(Algorithm, BlockMode)> {
        match self {
            Self::Plain => None,
            Self::AesEcb => Some((Algorithm::Aes, BlockMode::Ecb)),
            Self::AesCbc => Some((Algorithm::Aes, BlockMode::Cbc)),
            Self::DesEcb => Some((Algorithm::TripleDes, BlockMode::Ecb)),
            Self::DesCbc => Some((Algorithm::TripleDes, BlockMode::Cbc)),
        }
    }

    /// Returns true unless this is plaintext.
    #[must_use]
    pub const fn is_encrypted(self) -> bool {
        !matches!(self, Self::Plain)
    }

    /// Informational line sent once the mode is active.
    #[must_use]
    pub const fn notice(self) -> &'static str {
        match self {
            Self::Plain => "* WARNING, SENDING MESSAGES WITHOUT ENCRYPTION IS NOT SECURE!",
            Self::AesEcb => "* AES/ECB Encryption is established",
            Self::AesCbc => "* AES/CBC Encryption is established",
            Self::DesEcb => "* DESede/ECB Encryption is established",
            Self::DesCbc => "* DESede/CBC Encryption is established",
        }
    }
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The cipher state of a session at one point in time.
#[derive(Debug, Clone, Default)]
pub struct CipherContext {
    mode: CipherMode,
    cipher: Option<Cipher>,
}

impl CipherContext {
    /// Plaintext context.
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    /// Keyed context built from agreed key material.
    ///
    /// Falls back to plaintext when `mode` is [`CipherMode::Plain`].
    pub fn keyed(mode: CipherMode, material: &[u8]) -> Result<Self> {
        let cipher = match mode.cipher_spec() {
            Some((algorithm, block_mode)) => Some(Cipher::new(algorithm, block_mode, material)?),
            None => None,
        };
        Ok(Self { mode, cipher })
    }

    /// Returns the active mode.
    #[must_use]
    pub const fn mode(&self) -> CipherMode {
        self.mode
    }

    /// Returns the keyed cipher, if any.
    #[must_use]
    pub const fn cipher(&self) -> Option<&Cipher> {
        self.cipher.as_ref()
    }
}

/// Framed stream plus the current cipher context.
pub struct SecureChannel<S> {
    framed: FramedStream<S>,
    context: Arc<CipherContext>,
    idle_timeout: Duration,
}

impl<S> SecureChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a plaintext channel over `framed`.
    pub fn new(framed: FramedStream<S>, idle_timeout: Duration) -> Self {
        Self {
            framed,
            context: Arc::new(CipherContext::plain()),
            idle_timeout,
        }
    }

    /// Returns the active cipher mode.
    pub fn mode(&self) -> CipherMode {
        self.context.mode()
    }

    /// Returns the current cipher context.
    pub fn context(&self) -> Arc<CipherContext> {
        Arc::clone(&self.context)
    }

    /// Reads one command line, decrypting under the current mode.
    ///
    /// Trailing CR/LF is stripped. Invalid UTF-8 is replaced rather than
    /// rejected so the dispatcher can answer with a BAD line.
    pub async fn read_line(&mut self) -> Result<String> {
        let context = Arc::clone(&self.context);
        let plaintext = match context.cipher() {
            None => self.read_frame().await?,
            Some(cipher) => match cipher.mode() {
                BlockMode::Ecb => {
                    let ciphertext = self.read_frame().await?;
                    cipher.open(None, &ciphertext)?
                }
                BlockMode::Cbc => {
                    let iv = self.read_frame().await?;
                    let ciphertext = self.read_frame().await?;
                    cipher.open(Some(&iv), &ciphertext)?
                }
            },
        };

        let line = String::from_utf8_lossy(&plaintext);
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes one response line under the current mode.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let context = Arc::clone(&self.context);
        match context.cipher() {
            None => self.framed.write_frame(line.as_bytes()).await,
            Some(cipher) => {
                let (iv, ciphertext) = cipher.seal(line.as_bytes())?.into_parts();
                if let Some(iv) = iv {
                    self.framed.write_frame(&iv).await?;
                }
                self.framed.write_frame(&ciphertext).await
            }
        }
    }

    /// Runs the responder half of the handshake and swaps in `mode`.
    ///
    /// Plaintext needs no handshake. Otherwise the peer's public key is
    /// read first and ours is sent back, both as raw frames.
    pub async fn negotiate(&mut self, mode: CipherMode) -> Result<()> {
        if !mode.is_encrypted() {
            self.context = Arc::new(CipherContext::plain());
            return Ok(());
        }

        let peer = self.read_frame().await?;
        let pair = KeyPair::generate();
        self.framed.write_frame(&pair.public_bytes()).await?;
        let secret = pair.agree(&peer)?;

        self.context = Arc::new(CipherContext::keyed(mode, secret.as_bytes())?);
        Ok(())
    }

    /// Runs the initiator half of the handshake and swaps in `mode`.
    ///
    /// Used by clients: our public key goes out first.
    pub async fn initiate(&mut self, mode: CipherMode) -> Result<()> {
        if !mode.is_encrypted() {
            self.context = Arc::new(CipherContext::plain());
            return Ok(());
        }

        let pair = KeyPair::generate();
        self.framed.write_frame(&pair.public_bytes()).await?;
        let peer = self.read_frame().await?;
        let secret = pair.agree(&peer)?;

        self.context = Arc::new(CipherContext::keyed(mode, secret.as_bytes())?);
        Ok(())
    }

    /// Consumes the channel and returns the framed stream.
    pub fn into_inner(self) -> FramedStream<S> {
        self.framed
    }

    async fn read_frame(&mut self) -> Result<Vec<u8>> {
        tokio::time::timeout(self.idle_timeout, self.framed.read_frame())
            .await
            .map_err(|_| Error::Timeout(self.idle_timeout))?
    }
}
