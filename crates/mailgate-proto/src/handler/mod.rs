//! Command handlers.
//!
//! Each verb has one [`CommandHandler`]. A handler sees only the argument
//! text after the verb and a [`Context`] giving it the channel, the store
//! and the bound mailbox. It writes its own `*` lines and returns an
//! [`Outcome`]; the session writes the final `OK`/`BAD` line and applies
//! the stage transition.
//!
//! Recoverable failures are [`Outcome::Rejected`]. Returning `Err` closes
//! the connection.

mod auth;
mod credentials;
mod general;
pub mod help;
mod mailbox;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::connection::{BoxedStream, CipherMode, Config, SecureChannel};
use crate::protocol::{Stage, Verb};
use crate::store::MailStore;
use crate::{Error, Result};

pub use auth::AuthHandler;
pub use credentials::{CreateHandler, LoginHandler, TokenHandler};
pub use general::{HelpHandler, LogoutHandler, NoopHandler, QuitHandler};
pub use mailbox::{ChangeHandler, ExpungeHandler, FetchHandler, SearchHandler, SelectHandler};

/// Category of a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Malformed verb or arguments.
    Parse,
    /// Verb not legal in the current stage.
    Stage,
    /// Credentials or mailbox registration refused.
    Auth,
}

/// A recoverable failure, sent to the client as a `BAD` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    kind: RejectionKind,
    message: String,
}

impl Rejection {
    /// Creates a rejection.
    pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Stage violation naming the current stage.
    #[must_use]
    pub fn stage(stage: Stage) -> Self {
        Self::new(
            RejectionKind::Stage,
            format!(
                "Syntax Error, Mailbox is in {} STATE! For more info use HELP Command.",
                stage.wire_name()
            ),
        )
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> RejectionKind {
        self.kind
    }

    /// Returns the text without the `BAD ` prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BAD {}", self.message)
    }
}

/// Result of running a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command succeeded.
    Completed,
    /// The command succeeded and bound this mailbox to the session.
    Authenticated(String),
    /// The command was refused; the connection stays open.
    Rejected(Rejection),
}

impl Outcome {
    /// Rejects with a parse failure.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::Rejected(Rejection::new(RejectionKind::Parse, message))
    }

    /// Rejects with an authentication failure.
    pub fn auth_error(message: impl Into<String>) -> Self {
        Self::Rejected(Rejection::new(RejectionKind::Auth, message))
    }

    /// Returns true unless the outcome is a rejection.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// What a handler may touch while it runs.
pub struct Context<'a> {
    channel: &'a mut SecureChannel<BoxedStream>,
    store: &'a dyn MailStore,
    config: &'a Config,
    mailbox: Option<&'a str>,
}

impl<'a> Context<'a> {
    /// Creates a handler context.
    pub fn new(
        channel: &'a mut SecureChannel<BoxedStream>,
        store: &'a dyn MailStore,
        config: &'a Config,
        mailbox: Option<&'a str>,
    ) -> Self {
        Self {
            channel,
            store,
            config,
            mailbox,
        }
    }

    /// Writes one line to the client under the current cipher mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn reply(&mut self, line: &str) -> Result<()> {
        self.channel.write_line(line).await
    }

    /// Returns the mailbox store.
    #[must_use]
    pub fn store(&self) -> &'a dyn MailStore {
        self.store
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &'a Config {
        self.config
    }

    /// Returns the active cipher mode.
    #[must_use]
    pub fn mode(&self) -> CipherMode {
        self.channel.mode()
    }

    /// Returns the channel, for cipher negotiation.
    pub fn channel(&mut self) -> &mut SecureChannel<BoxedStream> {
        self.channel
    }

    /// Returns the bound mailbox.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if no mailbox is bound; the transition
    /// table makes this unreachable for mailbox verbs.
    pub fn mailbox(&self) -> Result<&'a str> {
        self.mailbox
            .ok_or_else(|| Error::Protocol("no mailbox bound to session".to_string()))
    }
}

/// A handler for one verb.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Runs the command with the text following the verb.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that must close the connection.
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome>;
}

/// Registry mapping each verb to its handler.
pub struct Handlers {
    map: HashMap<Verb, Box<dyn CommandHandler>>,
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("verbs", &self.map.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Handlers {
    fn default() -> Self {
        Self::standard()
    }
}

impl Handlers {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in handler for every verb.
    #[must_use]
    pub fn standard() -> Self {
        let mut handlers = Self::empty();
        handlers.register(Verb::Auth, AuthHandler);
        handlers.register(Verb::Login, LoginHandler);
        handlers.register(Verb::Create, CreateHandler);
        handlers.register(Verb::Token, TokenHandler);
        handlers.register(Verb::Select, SelectHandler);
        handlers.register(Verb::Fetch, FetchHandler);
        handlers.register(Verb::Search, SearchHandler);
        handlers.register(Verb::Change, ChangeHandler);
        handlers.register(Verb::Expunge, ExpungeHandler);
        handlers.register(Verb::Logout, LogoutHandler);
        handlers.register(Verb::Noop, NoopHandler);
        handlers.register(Verb::Help, HelpHandler);
        handlers.register(Verb::Quit, QuitHandler);
        handlers
    }

    /// Registers or replaces the handler for `verb`.
    pub fn register(&mut self, verb: Verb, handler: impl CommandHandler + 'static) {
        self.map.insert(verb, Box::new(handler));
    }

    /// Returns the handler for `verb`.
    #[must_use]
    pub fn get(&self, verb: Verb) -> Option<&dyn CommandHandler> {
        self.map.get(&verb).map(|handler| &**handler)
    }
}
