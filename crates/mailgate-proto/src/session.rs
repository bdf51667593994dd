//! Per-connection session.
//!
//! A session owns its channel, stage and bound mailbox. Each round trip
//! reads one line, dispatches it and writes the replies before the next
//! read; nothing is pipelined.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::command;
use crate::connection::{BoxedStream, Config, FramedStream, SecureChannel, Stream};
use crate::handler::{Context, Handlers, Outcome, Rejection, RejectionKind};
use crate::protocol::{Next, Stage, Verb, transition};
use crate::store::MailStore;
use crate::{Error, Result};

/// How long a closing notice may take to drain before it is dropped.
pub const NOTICE_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// One live connection.
pub struct Session {
    id: Uuid,
    channel: SecureChannel<BoxedStream>,
    store: Arc<dyn MailStore>,
    handlers: Arc<Handlers>,
    config: Arc<Config>,
    stage: Stage,
    mailbox: Option<String>,
}

impl Session {
    /// Creates a session over `stream` in the unauthenticated stage.
    pub fn new(
        stream: impl Stream + 'static,
        store: Arc<dyn MailStore>,
        handlers: Arc<Handlers>,
        config: Arc<Config>,
    ) -> Self {
        let boxed: BoxedStream = Box::new(stream);
        let framed = FramedStream::new(boxed, config.max_frame_size);
        Self {
            id: Uuid::new_v4(),
            channel: SecureChannel::new(framed, config.idle_timeout),
            store,
            handlers,
            config,
            stage: Stage::default(),
            mailbox: None,
        }
    }

    /// Returns the session id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the bound mailbox.
    #[must_use]
    pub fn mailbox(&self) -> Option<&str> {
        self.mailbox.as_deref()
    }

    /// Greets the client and serves commands until QUIT.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that ended the session. On idle timeout a
    /// closing notice is attempted first, bounded by
    /// [`NOTICE_WRITE_TIMEOUT`].
    pub async fn run(mut self) -> Result<()> {
        self.greet().await?;

        loop {
            let line = match self.channel.read_line().await {
                Ok(line) => line,
                Err(err) if err.is_timeout() => {
                    let notice = format!(
                        "BAD {} closing connection time out exceeded",
                        self.config.domain
                    );
                    self.notify(&notice).await;
                    return Err(err);
                }
                Err(err) => return Err(err),
            };

            if self.dispatch(&line).await? == Next::Close {
                return Ok(());
            }
        }
    }

    async fn greet(&mut self) -> Result<()> {
        if let Err(err) = self.store.ping().await {
            warn!(error = %err, "store unavailable, refusing connection");
            let notice = format!(
                "BAD {} not available, closing connection",
                self.config.domain
            );
            self.notify(&notice).await;
            return Err(Error::Storage(err));
        }
        let greeting = format!("OK {} Server running", self.config.domain);
        let idle = self.config.idle_timeout;
        tokio::time::timeout(idle, self.channel.write_line(&greeting))
            .await
            .map_err(|_| Error::Timeout(idle))?
    }

    /// Writes a closing notice, giving up once the peer stops draining.
    async fn notify(&mut self, notice: &str) {
        match tokio::time::timeout(NOTICE_WRITE_TIMEOUT, self.channel.write_line(notice)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!(error = %err, "closing notice not delivered"),
            Err(_) => debug!(
                limit = ?NOTICE_WRITE_TIMEOUT,
                "closing notice dropped, peer not reading"
            ),
        }
    }

    /// Handles one command line and returns where the session goes next.
    ///
    /// Rejected commands answer `BAD` and stay put.
    ///
    /// # Errors
    ///
    /// Returns an error for I/O, cipher or store failures.
    pub async fn dispatch(&mut self, line: &str) -> Result<Next> {
        if line.chars().count() > self.config.max_line_length {
            return self
                .reject(Rejection::new(
                    RejectionKind::Parse,
                    "Error Command line is too long!",
                ))
                .await;
        }

        let Some((token, args)) = command::split_verb(line) else {
            return self
                .reject(Rejection::new(RejectionKind::Parse, "Invalid command!"))
                .await;
        };

        let verb = Verb::parse(token);
        debug!(verb = %token.to_ascii_uppercase(), stage = %self.stage, "command received");

        let Some((verb, next)) =
            verb.and_then(|v| transition::lookup(self.stage, v).map(|next| (v, next)))
        else {
            return self.reject(Rejection::stage(self.stage)).await;
        };

        let handler = self
            .handlers
            .get(verb)
            .ok_or_else(|| Error::Protocol(format!("no handler registered for {verb}")))?;

        let mut ctx = Context::new(
            &mut self.channel,
            self.store.as_ref(),
            &self.config,
            self.mailbox.as_deref(),
        );
        let outcome = handler.execute(&mut ctx, args).await?;

        match outcome {
            Outcome::Rejected(rejection) => self.reject(rejection).await,
            Outcome::Authenticated(mailbox) => {
                self.mailbox = Some(mailbox);
                self.complete(verb, next).await
            }
            Outcome::Completed => self.complete(verb, next).await,
        }
    }

    async fn complete(&mut self, verb: Verb, next: Next) -> Result<Next> {
        self.channel
            .write_line(&format!("OK {verb} Completed"))
            .await?;

        if let Next::Enter(stage) = next {
            if stage == Stage::Unauthenticated {
                self.mailbox = None;
            }
            info!(from = %self.stage, to = %stage, mailbox = ?self.mailbox, "stage changed");
            self.stage = stage;
        }
        Ok(next)
    }

    async fn reject(&mut self, rejection: Rejection) -> Result<Next> {
        warn!(kind = ?rejection.kind(), stage = %self.stage, "command rejected");
        self.channel.write_line(&rejection.to_string()).await?;
        Ok(Next::Stay)
    }
}
