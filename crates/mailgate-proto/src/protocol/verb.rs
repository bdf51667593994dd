//! Command verbs.

use std::fmt;

/// A command verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Negotiate a cipher mode.
    Auth,
    /// Authenticate with mailbox and password.
    Login,
    /// Register a new mailbox.
    Create,
    /// Authenticate with mailbox and access token.
    Token,
    /// Open the bound mailbox.
    Select,
    /// Retrieve messages.
    Fetch,
    /// Search messages.
    Search,
    /// Change a message flag.
    Change,
    /// Delete messages flagged DELETED.
    Expunge,
    /// Return to the unauthenticated stage.
    Logout,
    /// Do nothing.
    Noop,
    /// Usage text.
    Help,
    /// Close the connection.
    Quit,
}

impl Verb {
    /// All verbs.
    pub const ALL: [Self; 13] = [
        Self::Auth,
        Self::Login,
        Self::Create,
        Self::Token,
        Self::Select,
        Self::Fetch,
        Self::Search,
        Self::Change,
        Self::Expunge,
        Self::Logout,
        Self::Noop,
        Self::Help,
        Self::Quit,
    ];

    /// Parses a verb token, ignoring case.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(token))
    }

    /// Returns the upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::Login => "LOGIN",
            Self::Create => "CREATE",
            Self::Token => "TOKEN",
            Self::Select => "SELECT",
            Self::Fetch => "FETCH",
            Self::Search => "SEARCH",
            Self::Change => "CHANGE",
            Self::Expunge => "EXPUNGE",
            Self::Logout => "LOGOUT",
            Self::Noop => "NOOP",
            Self::Help => "HELP",
            Self::Quit => "QUIT",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Verb::parse("fetch"), Some(Verb::Fetch));
        assert_eq!(Verb::parse("FeTcH"), Some(Verb::Fetch));
        assert_eq!(Verb::parse("EXPUNGE"), Some(Verb::Expunge));
        assert_eq!(Verb::parse("CAPABILITY"), None);
        assert_eq!(Verb::parse(""), None);
    }

    #[test]
    fn test_names_round_trip() {
        for verb in Verb::ALL {
            assert_eq!(Verb::parse(verb.as_str()), Some(verb));
        }
    }
}
