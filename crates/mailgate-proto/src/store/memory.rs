//! In-memory store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{MailStore, NewMessage, StoreError, StoreResult};
use crate::command::{SearchField, Selection};
use crate::types::{Flag, Message, MessageId, Uid};

#[derive(Debug)]
struct MailboxRecord {
    password_digest: String,
    token: String,
    domain: String,
    messages: Vec<Message>,
}

#[derive(Debug, Default)]
struct Inner {
    mailboxes: HashMap<String, MailboxRecord>,
    next_id: MessageId,
}

/// [`MailStore`] kept entirely in memory.
///
/// Useful for tests and for embedding the engine without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    offline: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose [`MailStore::ping`] always fails.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Appends a message to `mailbox` and returns its id.
    ///
    /// The new message gets UID 0 until the next UID reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox does not exist.
    pub fn insert_message(&self, mailbox: &str, message: NewMessage) -> StoreResult<MessageId> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        let record = inner
            .mailboxes
            .get_mut(mailbox)
            .ok_or_else(|| StoreError::new(format!("no such mailbox: {mailbox}")))?;
        record.messages.push(Message {
            id,
            uid: 0,
            sender: message.sender,
            recipients: message.recipients,
            subject: message.subject,
            date: message.date,
            mime: message.mime,
            body: message.body,
            flag: message.flag,
        });
        Ok(id)
    }

    /// Returns the domain a mailbox was created under.
    #[must_use]
    pub fn domain_of(&self, mailbox: &str) -> Option<String> {
        self.lock().mailboxes.get(mailbox).map(|r| r.domain.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_mailbox<T>(
        &self,
        mailbox: &str,
        f: impl FnOnce(&mut MailboxRecord) -> T,
    ) -> StoreResult<T> {
        let mut inner = self.lock();
        inner
            .mailboxes
            .get_mut(mailbox)
            .map(f)
            .ok_or_else(|| StoreError::new(format!("no such mailbox: {mailbox}")))
    }

    fn uids_where(
        &self,
        mailbox: &str,
        pred: impl Fn(&Message) -> bool,
    ) -> StoreResult<Vec<Uid>> {
        self.with_mailbox(mailbox, |record| {
            let mut uids: Vec<Uid> = record
                .messages
                .iter()
                .filter(|m| pred(m))
                .map(|m| m.uid)
                .collect();
            uids.sort_unstable();
            uids
        })
    }
}

/// Substring match ignoring ASCII case only, the same folding SQLite's
/// `lower()` applies.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

fn field_of(message: &Message, field: SearchField) -> &str {
    match field {
        SearchField::Body => &message.body,
        SearchField::Subject => &message.subject,
        SearchField::Sender => &message.sender,
        SearchField::Recipient => &message.recipients,
    }
}

#[async_trait]
impl MailStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        if self.offline {
            Err(StoreError::new("store is offline"))
        } else {
            Ok(())
        }
    }

    async fn mailbox_exists(&self, mailbox: &str) -> StoreResult<bool> {
        Ok(self.lock().mailboxes.contains_key(mailbox))
    }

    async fn create_mailbox(
        &self,
        mailbox: &str,
        password_digest: &str,
        token: &str,
        domain: &str,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.mailboxes.contains_key(mailbox) {
            return Err(StoreError::new(format!("mailbox already exists: {mailbox}")));
        }
        inner.mailboxes.insert(
            mailbox.to_string(),
            MailboxRecord {
                password_digest: password_digest.to_string(),
                token: token.to_string(),
                domain: domain.to_string(),
                messages: Vec::new(),
            },
        );
        Ok(())
    }

    async fn validate_mailbox(&self, mailbox: &str, password_digest: &str) -> StoreResult<bool> {
        Ok(self
            .lock()
            .mailboxes
            .get(mailbox)
            .is_some_and(|r| r.password_digest == password_digest))
    }

    async fn validate_token(&self, mailbox: &str, token: &str) -> StoreResult<bool> {
        Ok(self
            .lock()
            .mailboxes
            .get(mailbox)
            .is_some_and(|r| r.token == token))
    }

    async fn store_token(&self, mailbox: &str, token: &str) -> StoreResult<()> {
        self.with_mailbox(mailbox, |record| record.token = token.to_string())
    }

    async fn reset_uid_density(&self, mailbox: &str) -> StoreResult<()> {
        self.with_mailbox(mailbox, |record| {
            record.messages.sort_by_key(|m| (m.date, m.id));
            for (index, message) in record.messages.iter_mut().enumerate() {
                message.uid = Uid::try_from(index + 1).unwrap_or(Uid::MAX);
            }
        })
    }

    async fn count_messages(&self, mailbox: &str) -> StoreResult<u64> {
        self.with_mailbox(mailbox, |record| record.messages.len() as u64)
    }

    async fn count_by_flag(&self, mailbox: &str, flag: Flag) -> StoreResult<u64> {
        self.with_mailbox(mailbox, |record| {
            record.messages.iter().filter(|m| m.flag == flag).count() as u64
        })
    }

    async fn get_messages(
        &self,
        mailbox: &str,
        selection: &Selection,
    ) -> StoreResult<Vec<Message>> {
        self.with_mailbox(mailbox, |record| {
            let mut messages: Vec<Message> = record
                .messages
                .iter()
                .filter(|m| selection.matches(m.uid, m.flag))
                .cloned()
                .collect();
            messages.sort_by_key(|m| m.uid);
            messages
        })
    }

    async fn update_message_flag(
        &self,
        mailbox: &str,
        id: MessageId,
        flag: Flag,
    ) -> StoreResult<bool> {
        self.with_mailbox(mailbox, |record| {
            record
                .messages
                .iter_mut()
                .find(|m| m.id == id)
                .map(|m| m.flag = flag)
                .is_some()
        })
    }

    async fn delete_flagged(&self, mailbox: &str) -> StoreResult<u64> {
        self.with_mailbox(mailbox, |record| {
            let before = record.messages.len();
            record.messages.retain(|m| m.flag != Flag::Deleted);
            (before - record.messages.len()) as u64
        })
    }

    async fn search_by_key(
        &self,
        mailbox: &str,
        field: SearchField,
        value: &str,
    ) -> StoreResult<Vec<Uid>> {
        self.uids_where(mailbox, |m| contains_ci(field_of(m, field), value))
    }

    async fn search_all(&self, mailbox: &str, value: &str) -> StoreResult<Vec<Uid>> {
        self.uids_where(mailbox, |m| {
            SearchField::ALL
                .into_iter()
                .any(|field| contains_ci(field_of(m, field), value))
        })
    }

    async fn search_since(&self, mailbox: &str, date: NaiveDate) -> StoreResult<Vec<Uid>> {
        self.uids_where(mailbox, |m| m.date >= date)
    }

    async fn search_until(&self, mailbox: &str, date: NaiveDate) -> StoreResult<Vec<Uid>> {
        self.uids_where(mailbox, |m| m.date <= date)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn message(subject: &str, date: NaiveDate, flag: Flag) -> NewMessage {
        NewMessage {
            sender: "alice@derby.ac.uk".into(),
            recipients: "bob@derby.ac.uk".into(),
            subject: subject.into(),
            date,
            mime: "text/plain".into(),
            body: format!("body of {subject}"),
            flag,
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_mailbox("mailbox1", "DIGEST", "token-1", "derby.ac.uk")
            .await
            .unwrap();
        store
            .insert_message("mailbox1", message("third", day(3), Flag::Seen))
            .unwrap();
        store
            .insert_message("mailbox1", message("first", day(1), Flag::Recent))
            .unwrap();
        store
            .insert_message("mailbox1", message("second", day(2), Flag::Seen))
            .unwrap();
        store.reset_uid_density("mailbox1").await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_credentials() {
        let store = seeded().await;
        assert!(store.mailbox_exists("mailbox1").await.unwrap());
        assert!(!store.mailbox_exists("nobody").await.unwrap());
        assert!(store.validate_mailbox("mailbox1", "DIGEST").await.unwrap());
        assert!(!store.validate_mailbox("mailbox1", "OTHER").await.unwrap());
        assert!(store.validate_token("mailbox1", "token-1").await.unwrap());

        store.store_token("mailbox1", "token-2").await.unwrap();
        assert!(!store.validate_token("mailbox1", "token-1").await.unwrap());
        assert!(store.validate_token("mailbox1", "token-2").await.unwrap());
        assert_eq!(store.domain_of("mailbox1").as_deref(), Some("derby.ac.uk"));
    }

    #[tokio::test]
    async fn test_duplicate_mailbox_rejected() {
        let store = seeded().await;
        assert!(
            store
                .create_mailbox("mailbox1", "X", "Y", "derby.ac.uk")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_uid_reset_orders_by_date() {
        let store = seeded().await;
        let messages = store.get_messages("mailbox1", &Selection::All).await.unwrap();
        let subjects: Vec<_> = messages.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, ["first", "second", "third"]);
        let uids: Vec<_> = messages.iter().map(|m| m.uid).collect();
        assert_eq!(uids, [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_counts() {
        let store = seeded().await;
        assert_eq!(store.count_messages("mailbox1").await.unwrap(), 3);
        assert_eq!(store.count_by_flag("mailbox1", Flag::Seen).await.unwrap(), 2);
        assert_eq!(store.count_by_flag("mailbox1", Flag::Draft).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_flag_update_and_expunge() {
        let store = seeded().await;
        let first = store
            .get_messages("mailbox1", &Selection::Uid(1))
            .await
            .unwrap()
            .remove(0);

        assert!(
            store
                .update_message_flag("mailbox1", first.id, Flag::Deleted)
                .await
                .unwrap()
        );
        assert!(
            !store
                .update_message_flag("mailbox1", 9999, Flag::Deleted)
                .await
                .unwrap()
        );

        assert_eq!(store.delete_flagged("mailbox1").await.unwrap(), 1);
        store.reset_uid_density("mailbox1").await.unwrap();
        assert_eq!(store.count_messages("mailbox1").await.unwrap(), 2);
        assert_eq!(
            store.search_all("mailbox1", "").await.unwrap(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_searches() {
        let store = seeded().await;
        assert_eq!(store.search_since("mailbox1", day(2)).await.unwrap(), vec![2, 3]);
        assert_eq!(store.search_until("mailbox1", day(2)).await.unwrap(), vec![1, 2]);
        assert_eq!(
            store
                .search_by_key("mailbox1", SearchField::Subject, "SEC")
                .await
                .unwrap(),
            vec![2]
        );
        assert_eq!(
            store.search_all("mailbox1", "body of t").await.unwrap(),
            vec![3]
        );
        assert!(
            store
                .search_by_key("mailbox1", SearchField::Sender, "carol")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_search_folds_ascii_case_only() {
        let store = seeded().await;
        store
            .insert_message("mailbox1", message("été plans", day(4), Flag::Seen))
            .unwrap();
        store.reset_uid_density("mailbox1").await.unwrap();

        assert_eq!(
            store
                .search_by_key("mailbox1", SearchField::Subject, "été PLANS")
                .await
                .unwrap(),
            vec![4]
        );
        assert!(
            store
                .search_by_key("mailbox1", SearchField::Subject, "ÉTÉ")
                .await
                .unwrap()
                .is_empty()
        );
        assert!(store.search_all("mailbox1", "ÉTÉ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_ping() {
        assert!(MemoryStore::new().ping().await.is_ok());
        assert!(MemoryStore::offline().ping().await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_mailbox_is_error() {
        let store = MemoryStore::new();
        assert!(store.count_messages("nobody").await.is_err());
        assert!(store.insert_message("nobody", message("x", day(1), Flag::Recent)).is_err());
    }
}
