//! LOGIN, TOKEN and CREATE: binding a mailbox to the session.
//!
//! Passwords are digested before they reach the store. Every success
//! resets UID density so the Selected stage starts from dense UIDs.

use async_trait::async_trait;
use mailgate_crypto::{digest_hex, mint_token};
use tracing::info;

use super::{CommandHandler, Context, Outcome};
use crate::Result;
use crate::command;

const PARSE_ERROR: &str = "Authentication Failed, Parsing Arguments Error!";

/// Shortest accepted mailbox name or password.
pub const MIN_CREDENTIAL_LEN: usize = 8;

/// Longest accepted mailbox name or password.
pub const MAX_CREDENTIAL_LEN: usize = 30;

/// `LOGIN <mailbox> <password>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginHandler;

#[async_trait]
impl CommandHandler for LoginHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        let Some([mailbox, password]) = command::exact::<2>(args) else {
            return Ok(Outcome::parse_error(PARSE_ERROR));
        };

        let store = ctx.store();
        let digest = digest_hex(password.as_bytes());
        if !store.validate_mailbox(mailbox, &digest).await? {
            return Ok(Outcome::auth_error("mailbox validation failed"));
        }

        let token = mint_token();
        store.store_token(mailbox, &token).await?;
        store.reset_uid_density(mailbox).await?;

        if !ctx.mode().is_encrypted() {
            ctx.reply("* WARNING - ACCESS WITHOUT ENCRYPTION IS NOT SECURE!")
                .await?;
        }
        ctx.reply(&format!("* TOKEN {token}")).await?;

        info!(mailbox, "mailbox logged in");
        Ok(Outcome::Authenticated(mailbox.to_string()))
    }
}

/// `TOKEN <mailbox> <token>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenHandler;

#[async_trait]
impl CommandHandler for TokenHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        let Some([mailbox, token]) = command::exact::<2>(args) else {
            return Ok(Outcome::parse_error(PARSE_ERROR));
        };

        let store = ctx.store();
        if !store.validate_token(mailbox, token).await? {
            return Ok(Outcome::auth_error("Token Validation Failed"));
        }
        store.reset_uid_density(mailbox).await?;

        info!(mailbox, "mailbox authenticated by token");
        Ok(Outcome::Authenticated(mailbox.to_string()))
    }
}

/// `CREATE <mailbox> <password>`.
///
/// Name and password must both be 8 to 30 characters, and the name must
/// be 7-bit ASCII. All local checks run before the store is consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateHandler;

impl CreateHandler {
    /// Validates the shape of new credentials without touching the store.
    ///
    /// Returns the client-facing reason on failure.
    #[must_use]
    pub fn check(mailbox: &str, password: &str) -> Option<&'static str> {
        let mailbox_len = mailbox.chars().count();
        let password_len = password.chars().count();

        if mailbox_len < MIN_CREDENTIAL_LEN {
            Some("mailbox is too short, must be minimal 8 characters!")
        } else if mailbox_len > MAX_CREDENTIAL_LEN {
            Some("mailbox is too long, must be max 30 characters!")
        } else if password_len < MIN_CREDENTIAL_LEN {
            Some("Password is too short, must be minimal 8 characters!")
        } else if password_len > MAX_CREDENTIAL_LEN {
            Some("Password is too long, must be max 30 characters!")
        } else if !mailbox.is_ascii() {
            Some("Mailbox name must contain only 7-Bit ASCII Characters!")
        } else {
            None
        }
    }
}

#[async_trait]
impl CommandHandler for CreateHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        let Some([mailbox, password]) = command::exact::<2>(args) else {
            return Ok(Outcome::parse_error(PARSE_ERROR));
        };
        if let Some(reason) = Self::check(mailbox, password) {
            return Ok(Outcome::auth_error(reason));
        }

        let store = ctx.store();
        if store.mailbox_exists(mailbox).await? {
            return Ok(Outcome::auth_error(
                "mailbox Already Exists, Try different one",
            ));
        }

        let token = mint_token();
        let digest = digest_hex(password.as_bytes());
        store
            .create_mailbox(mailbox, &digest, &token, &ctx.config().domain)
            .await?;
        store.reset_uid_density(mailbox).await?;

        ctx.reply(&format!("* TOKEN {token}")).await?;

        info!(mailbox, "mailbox created");
        Ok(Outcome::Authenticated(mailbox.to_string()))
    }
}
