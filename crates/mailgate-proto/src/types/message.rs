//! Stored messages.

use chrono::NaiveDate;

use super::Flag;

/// Stable message identifier.
pub type MessageId = i64;

/// Per-mailbox sequence number, dense after a UID reset.
pub type Uid = u32;

/// A message as returned by the store.
///
/// Two messages are the same message when their [`MessageId`]s match.
#[derive(Debug, Clone)]
pub struct Message {
    /// Stable identifier.
    pub id: MessageId,
    /// Current UID.
    pub uid: Uid,
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
    /// Current flag.
    pub flag: Flag,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}

impl Message {
    /// Renders the message as sent in a FETCH body frame, without the
    /// trailing CRLF.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "ID: {}\r\nUID: {}\r\nSender: {}\r\nRecipients: {}\r\nSubject: {}\r\nDate: {}\r\nMime: {}\r\n{}",
            self.id,
            self.uid,
            self.sender,
            self.recipients,
            self.subject,
            self.date.format("%Y-%m-%d"),
            self.mime,
            self.body,
        )
    }
}
