//! Message flags.

use std::fmt;

/// The single mutable classification of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Newly arrived.
    Recent,
    /// Sent from this mailbox.
    Sent,
    /// Unsent draft.
    Draft,
    /// Read.
    Seen,
    /// Marked for removal by EXPUNGE.
    Deleted,
}

impl Flag {
    /// All flags, in the order SELECT reports them.
    pub const ALL: [Self; 5] = [
        Self::Recent,
        Self::Sent,
        Self::Draft,
        Self::Seen,
        Self::Deleted,
    ];

    /// Parses a flag name, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.as_str().eq_ignore_ascii_case(s))
    }

    /// Returns the flag as stored and sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "RECENT",
            Self::Sent => "SENT",
            Self::Draft => "DRAFT",
            Self::Seen => "SEEN",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
