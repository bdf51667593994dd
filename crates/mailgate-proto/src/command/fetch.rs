//! FETCH argument grammar.
//!
//! ```text
//! fetch     = [sequence] *(SP flag)
//! sequence  = number / number ":" number
//! flag      = "ALL" / "RECENT" / "SENT" / "DRAFT" / "SEEN" / "DELETED"
//! ```
//!
//! Precedence when several parts are present: a single UID wins and
//! ignores flags; a range with `ALL` or no flags is a plain range; a range
//! with flags filters the range; flags alone filter the whole mailbox; `ALL`
//! alone returns everything.

use crate::types::{Flag, Uid};

/// Which messages a FETCH asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// One message by UID.
    Uid(Uid),
    /// Every message with `first <= uid <= last`.
    Range {
        /// Lower bound, inclusive.
        first: Uid,
        /// Upper bound, inclusive.
        last: Uid,
    },
    /// Messages in the range carrying any of the flags.
    RangeWithFlags {
        /// Lower bound, inclusive.
        first: Uid,
        /// Upper bound, inclusive.
        last: Uid,
        /// Accepted flags.
        flags: Vec<Flag>,
    },
    /// Messages carrying any of the flags.
    Flags(Vec<Flag>),
    /// Every message.
    All,
}

impl Selection {
    /// Returns true if a message with `uid` and `flag` is selected.
    #[must_use]
    pub fn matches(&self, uid: Uid, flag: Flag) -> bool {
        match self {
            Self::Uid(n) => uid == *n,
            Self::Range { first, last } => (*first..=*last).contains(&uid),
            Self::RangeWithFlags { first, last, flags } => {
                (*first..=*last).contains(&uid) && flags.contains(&flag)
            }
            Self::Flags(flags) => flags.contains(&flag),
            Self::All => true,
        }
    }
}

enum Sequence {
    Single(Uid),
    Range(Uid, Uid),
}

/// Parses FETCH arguments.
///
/// Returns `None` for an empty argument list, an unknown flag or a
/// reversed range.
#[must_use]
pub fn parse(args: &str) -> Option<Selection> {
    let mut tokens = args.split_whitespace().peekable();
    let first_token = *tokens.peek()?;

    let sequence = match parse_sequence(first_token) {
        SequenceParse::Valid(sequence) => {
            tokens.next();
            Some(sequence)
        }
        SequenceParse::Reversed => return None,
        SequenceParse::NotSequence => None,
    };

    let mut all = false;
    let mut flags = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("ALL") {
            all = true;
        } else {
            let flag = Flag::parse(token)?;
            if !flags.contains(&flag) {
                flags.push(flag);
            }
        }
    }

    let selection = match sequence {
        Some(Sequence::Single(uid)) => Selection::Uid(uid),
        Some(Sequence::Range(first, last)) if all || flags.is_empty() => {
            Selection::Range { first, last }
        }
        Some(Sequence::Range(first, last)) => Selection::RangeWithFlags { first, last, flags },
        None if all => Selection::All,
        None => Selection::Flags(flags),
    };
    Some(selection)
}

enum SequenceParse {
    Valid(Sequence),
    Reversed,
    NotSequence,
}

fn parse_sequence(token: &str) -> SequenceParse {
    if let Some((first, last)) = token.split_once(':') {
        match (first.parse::<Uid>(), last.parse::<Uid>()) {
            (Ok(first), Ok(last)) if first <= last => {
                SequenceParse::Valid(Sequence::Range(first, last))
            }
            (Ok(_), Ok(_)) => SequenceParse::Reversed,
            _ => SequenceParse::NotSequence,
        }
    } else {
        token
            .parse::<Uid>()
            .map_or(SequenceParse::NotSequence, |uid| {
                SequenceParse::Valid(Sequence::Single(uid))
            })
    }
}
