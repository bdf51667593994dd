//! # mailgate-store
//!
//! `SQLite` persistence for the mailgate server.
//!
//! [`SqliteStore`] implements [`mailgate_proto::MailStore`]: mailbox
//! accounts with digested passwords and access tokens, messages with dense
//! per-mailbox UIDs, flag counts, flag updates, expunge and keyed search.
//! Dates are stored as `YYYY-MM-DD` text so they compare in date order.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod sqlite;

pub use error::{Error, Result};
pub use sqlite::SqliteStore;
