//! AUTH: cipher negotiation.

use async_trait::async_trait;
use tracing::info;

use super::{CommandHandler, Context, Outcome};
use crate::Result;
use crate::command;
use crate::connection::CipherMode;

/// `AUTH <mode>` where mode is AES/ECB, AES/CBC, DES/ECB, DES/CBC or PLAIN.
///
/// The handshake frames go out raw. The notice and the completion line are
/// written under the newly negotiated mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthHandler;

#[async_trait]
impl CommandHandler for AuthHandler {
    async fn execute(&self, ctx: &mut Context<'_>, args: &str) -> Result<Outcome> {
        let Some([name]) = command::exact::<1>(args) else {
            return Ok(Outcome::parse_error(
                "Authentication Failed, Parsing Arguments Error!",
            ));
        };
        let Some(mode) = CipherMode::parse(name) else {
            return Ok(Outcome::parse_error(
                "Syntax Error, Algorithm name is not valid!",
            ));
        };

        ctx.channel().negotiate(mode).await?;
        info!(%mode, "cipher negotiated");

        ctx.reply(mode.notice()).await?;
        Ok(Outcome::Completed)
    }
}
