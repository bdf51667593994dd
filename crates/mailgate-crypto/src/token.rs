//! Access token minting.

use uuid::Uuid;

/// Mints a fresh random access token.
///
/// Tokens are UUID v4 strings; they are handed to the client after LOGIN or
/// CREATE and can later replace the password via TOKEN.
#[must_use]
pub fn mint_token() -> String {
    Uuid::new_v4().to_string()
}
