//! Stage transition table.
//!
//! Each row says that `verb` is legal in `stage` and where the session
//! goes when the handler succeeds. A rejected command never moves the
//! session. Anything not in the table is a stage violation.

use super::{Stage, Verb};

/// Where a session goes after a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Remain in the current stage.
    Stay,
    /// Move to the given stage.
    Enter(Stage),
    /// Close the connection.
    Close,
}

/// Stage-specific rows.
const TABLE: &[(Stage, Verb, Next)] = &[
    (Stage::Unauthenticated, Verb::Auth, Next::Stay),
    (Stage::Unauthenticated, Verb::Login, Next::Enter(Stage::Selected)),
    (Stage::Unauthenticated, Verb::Create, Next::Enter(Stage::Selected)),
    (Stage::Unauthenticated, Verb::Token, Next::Enter(Stage::Selected)),
    (Stage::Selected, Verb::Select, Next::Enter(Stage::Active)),
    (Stage::Active, Verb::Fetch, Next::Stay),
    (Stage::Active, Verb::Search, Next::Stay),
    (Stage::Active, Verb::Change, Next::Stay),
    (Stage::Active, Verb::Expunge, Next::Stay),
    (Stage::Active, Verb::Logout, Next::Enter(Stage::Unauthenticated)),
];

/// Rows legal in every stage.
const ANY_STAGE: &[(Verb, Next)] = &[
    (Verb::Noop, Next::Stay),
    (Verb::Help, Next::Stay),
    (Verb::Quit, Next::Close),
];

/// Looks up the transition for `verb` in `stage`.
///
/// Returns `None` when the verb is not allowed there.
#[must_use]
pub fn lookup(stage: Stage, verb: Verb) -> Option<Next> {
    ANY_STAGE
        .iter()
        .find(|(v, _)| *v == verb)
        .map(|(_, next)| *next)
        .or_else(|| {
            TABLE
                .iter()
                .find(|(s, v, _)| *s == stage && *v == verb)
                .map(|(_, _, next)| *next)
        })
}

/// Returns the verbs legal in `stage`.
#[must_use]
pub fn allowed(stage: Stage) -> Vec<Verb> {
    Verb::ALL
        .into_iter()
        .filter(|verb| lookup(stage, *verb).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stage_strategy() -> impl Strategy<Value = Stage> {
        prop::sample::select(Stage::ALL.to_vec())
    }

    fn verb_strategy() -> impl Strategy<Value = Verb> {
        prop::sample::select(Verb::ALL.to_vec())
    }

    fn reference_allow_list(stage: Stage) -> &'static [Verb] {
        match stage {
            Stage::Unauthenticated => &[Verb::Auth, Verb::Login, Verb::Create, Verb::Token],
            Stage::Selected => &[Verb::Select],
            Stage::Active => &[
                Verb::Fetch,
                Verb::Search,
                Verb::Change,
                Verb::Expunge,
                Verb::Logout,
            ],
        }
    }

    #[test]
    fn test_login_advances_to_selected() {
        assert_eq!(
            lookup(Stage::Unauthenticated, Verb::Login),
            Some(Next::Enter(Stage::Selected))
        );
    }

    #[test]
    fn test_select_advances_to_active() {
        assert_eq!(
            lookup(Stage::Selected, Verb::Select),
            Some(Next::Enter(Stage::Active))
        );
    }

    #[test]
    fn test_logout_returns_to_unauthenticated() {
        assert_eq!(
            lookup(Stage::Active, Verb::Logout),
            Some(Next::Enter(Stage::Unauthenticated))
        );
    }

    #[test]
    fn test_quit_closes_everywhere() {
        for stage in Stage::ALL {
            assert_eq!(lookup(stage, Verb::Quit), Some(Next::Close));
        }
    }

    #[test]
    fn test_fetch_not_allowed_before_select() {
        assert_eq!(lookup(Stage::Unauthenticated, Verb::Fetch), None);
        assert_eq!(lookup(Stage::Selected, Verb::Fetch), None);
    }

    #[test]
    fn test_allowed_in_selected() {
        assert_eq!(
            allowed(Stage::Selected),
            vec![Verb::Select, Verb::Noop, Verb::Help, Verb::Quit]
        );
    }

    proptest! {
        #[test]
        fn prop_dispatch_matches_allow_list(stage in stage_strategy(), verb in verb_strategy()) {
            let agnostic = matches!(verb, Verb::Noop | Verb::Help | Verb::Quit);
            let expected = agnostic || reference_allow_list(stage).contains(&verb);
            prop_assert_eq!(lookup(stage, verb).is_some(), expected);
        }
    }
}
