//! Command line grammar.
//!
//! A line is `<VERB>[ <ARG>...]`. The verb is split off by the dispatcher;
//! handlers receive the rest and parse it with the helpers here. Arguments
//! are whitespace-delimited with a fixed arity per verb, except for FETCH
//! ([`fetch`]) and SEARCH ([`search`]).

pub mod fetch;
pub mod search;

pub use fetch::Selection;
pub use search::{SearchError, SearchField, SearchQuery};

/// Splits a raw line into its verb token and the remainder.
///
/// Returns `None` for a blank line.
#[must_use]
pub fn split_verb(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(
        line.split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim_start())),
    )
}

/// Splits `args` into exactly `N` whitespace-delimited tokens.
///
/// Returns `None` for any other count.
#[must_use]
pub fn exact<const N: usize>(args: &str) -> Option<[&str; N]> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    <[&str; N]>::try_from(tokens).ok()
}

/// Returns true if `args` holds no tokens.
#[must_use]
pub fn is_empty(args: &str) -> bool {
    args.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_verb() {
        assert_eq!(split_verb("LOGIN box pass"), Some(("LOGIN", "box pass")));
        assert_eq!(split_verb("  noop  "), Some(("noop", "")));
        assert_eq!(split_verb("SEARCH  ALL=[a b]"), Some(("SEARCH", "ALL=[a b]")));
        assert_eq!(split_verb("   "), None);
        assert_eq!(split_verb(""), None);
    }

    #[test]
    fn test_exact_arity() {
        assert_eq!(exact::<2>("mailbox password"), Some(["mailbox", "password"]));
        assert_eq!(exact::<2>("  mailbox\tpassword "), Some(["mailbox", "password"]));
        assert_eq!(exact::<2>("mailbox"), None);
        assert_eq!(exact::<2>("a b c"), None);
        assert_eq!(exact::<1>("AES/CBC"), Some(["AES/CBC"]));
        assert_eq!(exact::<0>(""), Some([]));
        assert_eq!(exact::<0>("x"), None);
    }

    #[test]
    fn test_is_empty() {
        assert!(is_empty(""));
        assert!(is_empty("   "));
        assert!(!is_empty(" x "));
    }
}
