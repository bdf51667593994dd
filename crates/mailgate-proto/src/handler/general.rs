//! Stage-agnostic and control verbs: NOOP, HELP, QUIT, LOGOUT.

use async_trait::async_trait;

use super::{CommandHandler, Context, Outcome, help};
use crate::Result;
use crate::command;
use crate::protocol::Verb;

fn no_arguments(args: &str) -> Outcome {
    if command::is_empty(args) {
        Outcome::Completed
    } else {
        Outcome::parse_error("Syntax Error")
    }
}

/// `NOOP`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    async fn execute(&self, _ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        Ok(no_arguments(args))
    }
}

/// `QUIT`. The session closes after the completion line.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuitHandler;

#[async_trait]
impl CommandHandler for QuitHandler {
    async fn execute(&self, _ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        Ok(no_arguments(args))
    }
}

/// `LOGOUT`. The session unbinds the mailbox and returns to the
/// unauthenticated stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogoutHandler;

#[async_trait]
impl CommandHandler for LogoutHandler {
    async fn execute(&self, _ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        Ok(no_arguments(args))
    }
}

/// `HELP [<verb>]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        let lines = match tokens.as_slice() {
            [] => help::OVERVIEW,
            [name] => match Verb::parse(name) {
                Some(verb) => help::usage(verb),
                None => return Ok(Outcome::parse_error("Argument is not valid Command!")),
            },
            _ => return Ok(Outcome::parse_error("Parsing Arguments Error!")),
        };

        for line in lines {
            ctx.reply(line).await?;
        }
        Ok(Outcome::Completed)
    }
}
