//! Error types for the SQLite store.

use mailgate_proto::StoreError;
use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Mailbox does not exist.
    #[error("Mailbox not found: {0}")]
    MailboxNotFound(String),

    /// Mailbox name is already taken.
    #[error("Mailbox already exists: {0}")]
    MailboxExists(String),

    /// A stored date could not be parsed.
    #[error("Invalid stored date {value:?} for message {id}")]
    InvalidDate {
        /// Message id.
        id: i64,
        /// Raw column value.
        value: String,
    },

    /// A stored flag is not one of the known flags.
    #[error("Invalid stored flag {value:?} for message {id}")]
    InvalidFlag {
        /// Message id.
        id: i64,
        /// Raw column value.
        value: String,
    },

    /// A stored UID does not fit the UID type.
    #[error("Invalid stored UID {value} for message {id}")]
    InvalidUid {
        /// Message id.
        id: i64,
        /// Raw column value.
        value: i64,
    },
}

impl From<Error> for StoreError {
    fn from(err: Error) -> Self {
        Self::with_source("sqlite store failure", err)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
