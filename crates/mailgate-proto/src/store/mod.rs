//! Mailbox store abstraction.
//!
//! The protocol engine never touches persistence directly; every handler
//! goes through [`MailStore`]. Passwords arrive here already digested.
//! UIDs returned by searches are in ascending order.

mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::command::{SearchField, Selection};
use crate::types::{Flag, Message, MessageId, Uid};

pub use memory::MemoryStore;

/// Error raised by a store backend.
///
/// Any store error is fatal to the connection that hit it.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Creates an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping a backend error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A message to be inserted into a mailbox.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Sender address.
    pub sender: String,
    /// Recipient addresses.
    pub recipients: String,
    /// Subject line.
    pub subject: String,
    /// Date received.
    pub date: NaiveDate,
    /// MIME type of the body.
    pub mime: String,
    /// Message body.
    pub body: String,
    /// Initial flag.
    pub flag: Flag,
}

/// Persistence collaborator for the protocol engine.
///
/// `mailbox` arguments are mailbox names. Implementations must be safe to
/// share across sessions.
#[async_trait]
pub trait MailStore: Send + Sync {
    /// Checks that the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Returns true if a mailbox with this name exists.
    async fn mailbox_exists(&self, mailbox: &str) -> StoreResult<bool>;

    /// Creates a mailbox.
    async fn create_mailbox(
        &self,
        mailbox: &str,
        password_digest: &str,
        token: &str,
        domain: &str,
    ) -> StoreResult<()>;

    /// Returns true if the digest matches the mailbox's password.
    async fn validate_mailbox(&self, mailbox: &str, password_digest: &str) -> StoreResult<bool>;

    /// Returns true if the token matches the mailbox's current token.
    async fn validate_token(&self, mailbox: &str, token: &str) -> StoreResult<bool>;

    /// Replaces the mailbox's access token.
    async fn store_token(&self, mailbox: &str, token: &str) -> StoreResult<()>;

    /// Renumbers UIDs 1..N by date, ties broken by message id.
    async fn reset_uid_density(&self, mailbox: &str) -> StoreResult<()>;

    /// Counts all messages in the mailbox.
    async fn count_messages(&self, mailbox: &str) -> StoreResult<u64>;

    /// Counts messages carrying `flag`.
    async fn count_by_flag(&self, mailbox: &str, flag: Flag) -> StoreResult<u64>;

    /// Returns the selected messages ordered by UID.
    async fn get_messages(&self, mailbox: &str, selection: &Selection)
    -> StoreResult<Vec<Message>>;

    /// Sets the flag of message `id`. Returns false if no such message
    /// exists in this mailbox.
    async fn update_message_flag(
        &self,
        mailbox: &str,
        id: MessageId,
        flag: Flag,
    ) -> StoreResult<bool>;

    /// Deletes every DELETED message. Returns how many were removed.
    async fn delete_flagged(&self, mailbox: &str) -> StoreResult<u64>;

    /// UIDs whose `field` contains `value`.
    async fn search_by_key(
        &self,
        mailbox: &str,
        field: SearchField,
        value: &str,
    ) -> StoreResult<Vec<Uid>>;

    /// UIDs where any text field contains `value`.
    async fn search_all(&self, mailbox: &str, value: &str) -> StoreResult<Vec<Uid>>;

    /// UIDs dated on or after `date`.
    async fn search_since(&self, mailbox: &str, date: NaiveDate) -> StoreResult<Vec<Uid>>;

    /// UIDs dated on or before `date`.
    async fn search_until(&self, mailbox: &str, date: NaiveDate) -> StoreResult<Vec<Uid>>;
}
