//! SQLite mailbox store.

use async_trait::async_trait;
use chrono::NaiveDate;
use mailgate_proto::command::search::DATE_FORMAT;
use mailgate_proto::command::{SearchField, Selection};
use mailgate_proto::{Flag, MailStore, Message, MessageId, NewMessage, StoreResult, Uid};
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row};
use tracing::{debug, info};

use crate::{Error, Result};

const MESSAGE_COLUMNS: &str = r"
    SELECT m.id, m.uid, m.sender, m.recipients, m.subject, m.date, m.mime, m.body, m.flag
    FROM messages m
    JOIN mailboxes b ON b.id = m.mailbox_id
    WHERE b.name = ";

/// Mailbox store backed by a SQLite database.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the database at `database_path`.
    ///
    /// Creates the tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        info!(path = database_path, "opened mailbox database");
        Ok(store)
    }

    /// Creates an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS mailboxes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                token TEXT NOT NULL,
                domain TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mailbox_id INTEGER NOT NULL REFERENCES mailboxes(id) ON DELETE CASCADE,
                uid INTEGER NOT NULL DEFAULT 0,
                sender TEXT NOT NULL,
                recipients TEXT NOT NULL,
                subject TEXT NOT NULL,
                date TEXT NOT NULL,
                mime TEXT NOT NULL,
                body TEXT NOT NULL,
                flag TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"CREATE INDEX IF NOT EXISTS idx_messages_mailbox_uid ON messages(mailbox_id, uid)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Runs a trivial query to check the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn check_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Returns true if the mailbox exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn exists(&self, mailbox: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM mailboxes WHERE name = ?")
            .bind(mailbox)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Creates a mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MailboxExists`] if the name is taken, or an error if
    /// the database query fails.
    pub async fn create(
        &self,
        mailbox: &str,
        password_digest: &str,
        token: &str,
        domain: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            INSERT INTO mailboxes (name, password, token, domain)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(mailbox)
        .bind(password_digest)
        .bind(token)
        .bind(domain)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(mailbox, domain, "created mailbox");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::MailboxExists(mailbox.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Returns true if `password_digest` matches the stored digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn verify_password(&self, mailbox: &str, password_digest: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM mailboxes WHERE name = ? AND password = ?")
            .bind(mailbox)
            .bind(password_digest)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Returns true if `token` is the mailbox's current token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn verify_token(&self, mailbox: &str, token: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM mailboxes WHERE name = ? AND token = ?")
            .bind(mailbox)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Replaces the mailbox's token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MailboxNotFound`] if there is no such mailbox, or an
    /// error if the database query fails.
    pub async fn set_token(&self, mailbox: &str, token: &str) -> Result<()> {
        let result = sqlx::query("UPDATE mailboxes SET token = ? WHERE name = ?")
            .bind(token)
            .bind(mailbox)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::MailboxNotFound(mailbox.to_string()));
        }
        Ok(())
    }

    /// Inserts a message and returns its id. The UID stays 0 until the
    /// next [`renumber`](Self::renumber).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MailboxNotFound`] if there is no such mailbox, or an
    /// error if the database query fails.
    pub async fn insert_message(&self, mailbox: &str, message: &NewMessage) -> Result<MessageId> {
        let mailbox_id: Option<i64> = sqlx::query_scalar("SELECT id FROM mailboxes WHERE name = ?")
            .bind(mailbox)
            .fetch_optional(&self.pool)
            .await?;
        let mailbox_id = mailbox_id.ok_or_else(|| Error::MailboxNotFound(mailbox.to_string()))?;

        let result = sqlx::query(
            r"
            INSERT INTO messages (mailbox_id, sender, recipients, subject, date, mime, body, flag)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(mailbox_id)
        .bind(&message.sender)
        .bind(&message.recipients)
        .bind(&message.subject)
        .bind(message.date.format(DATE_FORMAT).to_string())
        .bind(&message.mime)
        .bind(&message.body)
        .bind(message.flag.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Renumbers the mailbox's UIDs 1..N by date, ties broken by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn renumber(&self, mailbox: &str) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET uid = (
                SELECT COUNT(*)
                FROM messages AS earlier
                WHERE earlier.mailbox_id = messages.mailbox_id
                  AND (earlier.date < messages.date
                       OR (earlier.date = messages.date AND earlier.id <= messages.id))
            )
            WHERE mailbox_id = (SELECT id FROM mailboxes WHERE name = ?)
            ",
        )
        .bind(mailbox)
        .execute(&self.pool)
        .await?;

        debug!(mailbox, renumbered = result.rows_affected(), "reset UID density");
        Ok(())
    }

    /// Counts the mailbox's messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, mailbox: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM messages m
            JOIN mailboxes b ON b.id = m.mailbox_id
            WHERE b.name = ?
            ",
        )
        .bind(mailbox)
        .fetch_one(&self.pool)
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Counts the mailbox's messages carrying `flag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_flagged(&self, mailbox: &str, flag: Flag) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM messages m
            JOIN mailboxes b ON b.id = m.mailbox_id
            WHERE b.name = ? AND m.flag = ?
            ",
        )
        .bind(mailbox)
        .bind(flag.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Returns the selected messages ordered by UID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn messages(&self, mailbox: &str, selection: &Selection) -> Result<Vec<Message>> {
        let mut query = QueryBuilder::<Sqlite>::new(MESSAGE_COLUMNS);
        query.push_bind(mailbox);

        match selection {
            Selection::Uid(uid) => {
                query.push(" AND m.uid = ").push_bind(i64::from(*uid));
            }
            Selection::Range { first, last } => push_range(&mut query, *first, *last),
            Selection::RangeWithFlags { first, last, flags } => {
                push_range(&mut query, *first, *last);
                push_flags(&mut query, flags);
            }
            Selection::Flags(flags) => push_flags(&mut query, flags),
            Selection::All => {}
        }
        query.push(" ORDER BY m.uid, m.id");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_message).collect()
    }

    /// Sets the flag of message `id` in `mailbox`. Returns false if the
    /// message does not exist there.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_flag(&self, mailbox: &str, id: MessageId, flag: Flag) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE messages SET flag = ?
            WHERE id = ? AND mailbox_id = (SELECT id FROM mailboxes WHERE name = ?)
            ",
        )
        .bind(flag.as_str())
        .bind(id)
        .bind(mailbox)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes every message flagged DELETED. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn expunge(&self, mailbox: &str) -> Result<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM messages
            WHERE flag = ? AND mailbox_id = (SELECT id FROM mailboxes WHERE name = ?)
            ",
        )
        .bind(Flag::Deleted.as_str())
        .bind(mailbox)
        .execute(&self.pool)
        .await?;

        debug!(mailbox, removed = result.rows_affected(), "expunged");
        Ok(result.rows_affected())
    }

    /// UIDs whose `field` contains `value`, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search_field(
        &self,
        mailbox: &str,
        field: SearchField,
        value: &str,
    ) -> Result<Vec<Uid>> {
        let column = column_of(field);
        let sql = format!(
            r"
            SELECT m.id, m.uid FROM messages m
            JOIN mailboxes b ON b.id = m.mailbox_id
            WHERE b.name = ? AND instr(lower(m.{column}), lower(?)) > 0
            ORDER BY m.uid
            "
        );
        let rows = sqlx::query(&sql)
            .bind(mailbox)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_uid).collect()
    }

    /// UIDs where any text field contains `value`, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search_any(&self, mailbox: &str, value: &str) -> Result<Vec<Uid>> {
        let rows = sqlx::query(
            r"
            SELECT m.id, m.uid FROM messages m
            JOIN mailboxes b ON b.id = m.mailbox_id
            WHERE b.name = ?1
              AND (instr(lower(m.subject), lower(?2)) > 0
                   OR instr(lower(m.sender), lower(?2)) > 0
                   OR instr(lower(m.recipients), lower(?2)) > 0
                   OR instr(lower(m.body), lower(?2)) > 0)
            ORDER BY m.uid
            ",
        )
        .bind(mailbox)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_uid).collect()
    }

    /// UIDs dated on or after `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn dated_since(&self, mailbox: &str, date: NaiveDate) -> Result<Vec<Uid>> {
        self.dated(mailbox, ">=", date).await
    }

    /// UIDs dated on or before `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn dated_until(&self, mailbox: &str, date: NaiveDate) -> Result<Vec<Uid>> {
        self.dated(mailbox, "<=", date).await
    }

    async fn dated(&self, mailbox: &str, op: &'static str, date: NaiveDate) -> Result<Vec<Uid>> {
        let sql = format!(
            r"
            SELECT m.id, m.uid FROM messages m
            JOIN mailboxes b ON b.id = m.mailbox_id
            WHERE b.name = ? AND m.date {op} ?
            ORDER BY m.uid
            "
        );
        let rows = sqlx::query(&sql)
            .bind(mailbox)
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_uid).collect()
    }
}

fn push_range(query: &mut QueryBuilder<'_, Sqlite>, first: Uid, last: Uid) {
    query
        .push(" AND m.uid BETWEEN ")
        .push_bind(i64::from(first))
        .push(" AND ")
        .push_bind(i64::from(last));
}

fn push_flags(query: &mut QueryBuilder<'_, Sqlite>, flags: &[Flag]) {
    if flags.is_empty() {
        query.push(" AND 0");
        return;
    }
    query.push(" AND m.flag IN (");
    let mut list = query.separated(", ");
    for flag in flags {
        list.push_bind(flag.as_str());
    }
    list.push_unseparated(")");
}

const fn column_of(field: SearchField) -> &'static str {
    match field {
        SearchField::Body => "body",
        SearchField::Subject => "subject",
        SearchField::Sender => "sender",
        SearchField::Recipient => "recipients",
    }
}

fn row_to_uid(row: &SqliteRow) -> Result<Uid> {
    let id: i64 = row.get("id");
    let uid: i64 = row.get("uid");
    Uid::try_from(uid).map_err(|_| Error::InvalidUid { id, value: uid })
}

fn row_to_message(row: &SqliteRow) -> Result<Message> {
    let id: i64 = row.get("id");
    let date: String = row.get("date");
    let flag: String = row.get("flag");

    Ok(Message {
        id,
        uid: row_to_uid(row)?,
        sender: row.get("sender"),
        recipients: row.get("recipients"),
        subject: row.get("subject"),
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|_| Error::InvalidDate { id, value: date.clone() })?,
        mime: row.get("mime"),
        body: row.get("body"),
        flag: Flag::parse(&flag).ok_or(Error::InvalidFlag { id, value: flag })?,
    })
}

#[async_trait]
impl MailStore for SqliteStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(self.check_connection().await?)
    }

    async fn mailbox_exists(&self, mailbox: &str) -> StoreResult<bool> {
        Ok(self.exists(mailbox).await?)
    }

    async fn create_mailbox(
        &self,
        mailbox: &str,
        password_digest: &str,
        token: &str,
        domain: &str,
    ) -> StoreResult<()> {
        Ok(self.create(mailbox, password_digest, token, domain).await?)
    }

    async fn validate_mailbox(&self, mailbox: &str, password_digest: &str) -> StoreResult<bool> {
        Ok(self.verify_password(mailbox, password_digest).await?)
    }

    async fn validate_token(&self, mailbox: &str, token: &str) -> StoreResult<bool> {
        Ok(self.verify_token(mailbox, token).await?)
    }

    async fn store_token(&self, mailbox: &str, token: &str) -> StoreResult<()> {
        Ok(self.set_token(mailbox, token).await?)
    }

    async fn reset_uid_density(&self, mailbox: &str) -> StoreResult<()> {
        Ok(self.renumber(mailbox).await?)
    }

    async fn count_messages(&self, mailbox: &str) -> StoreResult<u64> {
        Ok(self.count(mailbox).await?)
    }

    async fn count_by_flag(&self, mailbox: &str, flag: Flag) -> StoreResult<u64> {
        Ok(self.count_flagged(mailbox, flag).await?)
    }

    async fn get_messages(
        &self,
        mailbox: &str,
        selection: &Selection,
    ) -> StoreResult<Vec<Message>> {
        Ok(self.messages(mailbox, selection).await?)
    }

    async fn update_message_flag(
        &self,
        mailbox: &str,
        id: MessageId,
        flag: Flag,
    ) -> StoreResult<bool> {
        Ok(self.set_flag(mailbox, id, flag).await?)
    }

    async fn delete_flagged(&self, mailbox: &str) -> StoreResult<u64> {
        Ok(self.expunge(mailbox).await?)
    }

    async fn search_by_key(
        &self,
        mailbox: &str,
        field: SearchField,
        value: &str,
    ) -> StoreResult<Vec<Uid>> {
        Ok(self.search_field(mailbox, field, value).await?)
    }

    async fn search_all(&self, mailbox: &str, value: &str) -> StoreResult<Vec<Uid>> {
        Ok(self.search_any(mailbox, value).await?)
    }

    async fn search_since(&self, mailbox: &str, date: NaiveDate) -> StoreResult<Vec<Uid>> {
        Ok(self.dated_since(mailbox, date).await?)
    }

    async fn search_until(&self, mailbox: &str, date: NaiveDate) -> StoreResult<Vec<Uid>> {
        Ok(self.dated_until(mailbox, date).await?)
    }
}
