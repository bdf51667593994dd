//! Fatal error channel for a connection.
//!
//! Anything surfaced as [`Error`] ends the session loop. Validation
//! failures that keep the connection open are expressed as
//! [`crate::Outcome::Rejected`] instead.

use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Errors that terminate a connection.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Handshake or cipher failure.
    #[error("Crypto error: {0}")]
    Crypto(#[from] mailgate_crypto::Error),

    /// The mailbox store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// No frame arrived within the idle timeout.
    #[error("Read timed out after {0:?}")]
    Timeout(Duration),

    /// A frame length prefix exceeded the configured maximum.
    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge {
        /// Length announced by the prefix.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Internal protocol invariant broken.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if the error is an idle timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns true if the peer closed the connection.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Io(e) if matches!(
            e.kind(),
            std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::BrokenPipe
        ))
    }
}
