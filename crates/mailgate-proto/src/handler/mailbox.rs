//! SELECT, FETCH, SEARCH, CHANGE and EXPUNGE: commands on the bound mailbox.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{CommandHandler, Context, Outcome};
use crate::Result;
use crate::command::{self, SearchQuery, fetch, search};
use crate::types::{Flag, Message, MessageId};

/// `SELECT`: renumber UIDs and report counts.
///
/// Sends `* <n> EXISTS` followed by one `* <n> <FLAG>` line per flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectHandler;

#[async_trait]
impl CommandHandler for SelectHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        if !command::is_empty(args) {
            return Ok(Outcome::parse_error(
                "SELECT command does not accept arguments!",
            ));
        }

        let mailbox = ctx.mailbox()?;
        let store = ctx.store();
        store.reset_uid_density(mailbox).await?;

        let total = store.count_messages(mailbox).await?;
        ctx.reply(&format!("* {total} EXISTS")).await?;
        for flag in Flag::ALL {
            let count = store.count_by_flag(mailbox, flag).await?;
            ctx.reply(&format!("* {count} {flag}")).await?;
        }

        info!(mailbox, total, "mailbox selected");
        Ok(Outcome::Completed)
    }
}

/// `FETCH [<uid> | <uid>:<uid>] [<flag>...]`.
///
/// Each message goes out as a header frame `* FETCH ID <id> SIZE <n>`
/// followed by the rendered message, both CRLF-terminated.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchHandler;

/// Drops repeated message identities and orders by UID.
fn consolidate(mut messages: Vec<Message>) -> Vec<Message> {
    let mut seen = HashSet::new();
    messages.retain(|m| seen.insert(m.id));
    messages.sort_by_key(|m| m.uid);
    messages
}

#[async_trait]
impl CommandHandler for FetchHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        let Some(selection) = fetch::parse(args) else {
            return Ok(Outcome::parse_error("FETCH syntax error"));
        };

        let mailbox = ctx.mailbox()?;
        let messages = consolidate(ctx.store().get_messages(mailbox, &selection).await?);
        debug!(?selection, count = messages.len(), "fetch resolved");

        if messages.is_empty() {
            ctx.reply("* No messages found!").await?;
            return Ok(Outcome::Completed);
        }

        for message in &messages {
            let rendered = message.render();
            ctx.reply(&format!(
                "* FETCH ID {} SIZE {}\r\n",
                message.id,
                rendered.len()
            ))
            .await?;
            ctx.reply(&format!("{rendered}\r\n")).await?;
        }
        Ok(Outcome::Completed)
    }
}

/// `SEARCH <KEY>=[<VALUE>]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchHandler;

#[async_trait]
impl CommandHandler for SearchHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        let query = match search::parse(args) {
            Ok(query) => query,
            Err(err) => return Ok(Outcome::parse_error(err.message())),
        };

        let mailbox = ctx.mailbox()?;
        let store = ctx.store();
        let mut uids = match &query {
            SearchQuery::All(value) => store.search_all(mailbox, value).await?,
            SearchQuery::Field(field, value) => store.search_by_key(mailbox, *field, value).await?,
            SearchQuery::Since(date) => store.search_since(mailbox, *date).await?,
            SearchQuery::Until(date) => store.search_until(mailbox, *date).await?,
        };
        uids.sort_unstable();
        uids.dedup();

        if uids.is_empty() {
            ctx.reply("* SEARCH FOUND NO RESULTS").await?;
        } else {
            let list: Vec<String> = uids.iter().map(ToString::to_string).collect();
            ctx.reply(&format!("* SEARCH {}", list.join(" "))).await?;
        }
        Ok(Outcome::Completed)
    }
}

/// `CHANGE <message-id> <flag>`.
///
/// Takes the stable message id, not the UID.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeHandler;

#[async_trait]
impl CommandHandler for ChangeHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        let Some([id, flag]) = command::exact::<2>(args) else {
            return Ok(Outcome::parse_error("Parsing Arguments Error!"));
        };
        let Ok(id) = id.parse::<MessageId>() else {
            return Ok(Outcome::parse_error("Message must be number!"));
        };
        let Some(flag) = Flag::parse(flag) else {
            return Ok(Outcome::parse_error("Flag is not valid!"));
        };

        let mailbox = ctx.mailbox()?;
        if !ctx.store().update_message_flag(mailbox, id, flag).await? {
            return Ok(Outcome::parse_error("Message ID is not valid!"));
        }

        debug!(id, %flag, "flag changed");
        Ok(Outcome::Completed)
    }
}

/// `EXPUNGE`: delete every DELETED message, then renumber UIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpungeHandler;

#[async_trait]
impl CommandHandler for ExpungeHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        if !command::is_empty(args) {
            return Ok(Outcome::parse_error(
                "EXPUNGE command does not accept arguments!",
            ));
        }

        let mailbox = ctx.mailbox()?;
        let store = ctx.store();
        let removed = store.delete_flagged(mailbox).await?;
        store.reset_uid_density(mailbox).await?;

        info!(mailbox, removed, "mailbox expunged");
        Ok(Outcome::Completed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn message(id: MessageId, uid: u32) -> Message {
        Message {
            id,
            uid,
            sender: String::new(),
            recipients: String::new(),
            subject: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            mime: String::new(),
            body: String::new(),
            flag: Flag::Seen,
        }
    }

    #[test]
    fn test_consolidate_removes_duplicates() {
        let out = consolidate(vec![message(5, 2), message(3, 1), message(5, 2)]);
        let ids: Vec<_> = out.iter().map(|m| m.id).collect();
        assert_eq!(ids, [3, 5]);
    }

    #[test]
    fn test_consolidate_orders_by_uid() {
        let out = consolidate(vec![message(1, 3), message(2, 1), message(3, 2)]);
        let uids: Vec<_> = out.iter().map(|m| m.uid).collect();
        assert_eq!(uids, [1, 2, 3]);
    }
}
