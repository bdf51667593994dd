//! Session stages.

use std::fmt;

/// Protocol stage of a session.
///
/// - `Unauthenticated`: cipher negotiation and credentials (AUTH, LOGIN,
///   CREATE, TOKEN)
/// - `Selected`: a mailbox is bound but not yet opened (SELECT)
/// - `Active`: the mailbox is open (FETCH, SEARCH, CHANGE, EXPUNGE, LOGOUT)
///
/// NOOP, HELP and QUIT are legal everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    /// Waiting for credentials.
    #[default]
    Unauthenticated,
    /// Mailbox bound, waiting for SELECT.
    Selected,
    /// Mailbox open for message commands.
    Active,
}

impl Stage {
    /// All stages.
    pub const ALL: [Self; 3] = [Self::Unauthenticated, Self::Selected, Self::Active];

    /// Name used in client-facing stage errors.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Unauthenticated => "AUTHENTICATE",
            Self::Selected => "SELECT",
            Self::Active => "CONTROL",
        }
    }

    /// Returns true if a mailbox must be bound in this stage.
    #[must_use]
    pub const fn has_mailbox(self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
