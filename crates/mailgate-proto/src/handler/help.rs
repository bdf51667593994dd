//! Usage text for HELP.

use crate::protocol::Verb;

/// Lines for a bare `HELP`.
pub const OVERVIEW: &[&str] = &[
    "* MOST COMMANDS ARE ONLY VALID IN CERTAIN STATE!",
    "* AUTHENTICATED STATE COMMANDS: AUTH, LOGIN, TOKEN, CREATE",
    "* SELECT STAGE COMMANDS: SELECT",
    "* CONTROL STAGE COMMANDS : FETCH, EXPUNGE, CHANGE, SEARCH, LOGOUT",
    "* COMMANDS PERMITTED IN ANY STATE: NOOP, HELP, QUIT",
    "* For more info use HELP<SP><COMMAND>",
];

/// Lines for `HELP <verb>`.
#[must_use]
pub const fn usage(verb: Verb) -> &'static [&'static str] {
    match verb {
        Verb::Auth => &[
            "* Syntax: AUTH<SP><ARGUMENT>",
            "* ARGUMENTS:",
            "* AES/CBC - AES Encryption with Cipher Block Chaining mode",
            "* AES/ECB - AES Encryption with Electronic CodeBook mode",
            "* DES/CBC - DESede Encryption with Cipher Block Chaining mode",
            "* DES/ECB - DESede Encryption with Electronic CodeBook mode",
            "* PLAIN - No encryption",
        ],
        Verb::Login => &["* Syntax: LOGIN<SP><MAILBOX><SP><PASSWORD>"],
        Verb::Token => &["* Syntax: TOKEN<SP><MAILBOX><SP><TOKEN>"],
        Verb::Create => &[
            "* Syntax: CREATE<SP><MAILBOX><SP><PASSWORD>",
            "* CREATE Command will create new Mailbox",
        ],
        Verb::Select => &[
            "* Syntax: SELECT",
            "* SELECT Command does not accept arguments",
            "* Function: Command sets all messages UID number sorted by date which message has been recieved",
            "* WARNING: SELECT Command must be called after login and before using Mailbox CONTROL Commands",
            "* CONTROL COMMANDS: FETCH, SEARCH, CHANGE, EXPUNGE AND LOGOUT",
        ],
        Verb::Fetch => &[
            "* Syntax: FETCH<SP><SEQUENCE><SP><FLAG> | FETCH<SP><FLAG>",
            "* SEQUENCE: <NUMBER><:><NUMBER> | <NUMBER>",
            "* FLAG: ALL, RECENT, SENT, DRAFT, SEEN or DELETED",
            "* FETCH Command supports argument chaining -> FETCH<SP><FLAG><SP><FLAG>",
        ],
        Verb::Search => &[
            "* Syntax: SEARCH<SP><SEARCH_KEY><=><[SEARCH_VALUE]>",
            "* SEARCH_KEY: ALL, BODY, SUBJECT, SENDER, RECIPIENT, SINCE or UNTIL",
            "* SINCE and UNTIL: SEARCH_VALUE must be Date formated [yyyy-MM-dd]",
        ],
        Verb::Change => &[
            "* Syntax: CHANGE<SP><MESSAGE_ID><SP><FLAG>",
            "* WARNING: MESSAGE_ID is ID not UID of the message",
            "* FLAG: RECENT, SENT, DRAFT, SEEN or DELETED",
        ],
        Verb::Expunge => &[
            "* Syntax: EXPUNGE",
            "* EXPUNGE Command does not accept arguments",
            "* Function: EXPUNGE Command will delete all messages marked as DELETED from database",
        ],
        Verb::Logout => &[
            "* Syntax: LOGOUT",
            "* LOGOUT Command does not accept arguments",
        ],
        Verb::Noop => &[
            "* Syntax: NOOP",
            "* NOOP Command does not accept arguments",
            "* Function: This command will keep connection with server \"alive\"",
        ],
        Verb::Help => &[
            "* Syntax: HELP | HELP<SP><COMMAND>",
            "* Function: Describe all commands or a single command",
        ],
        Verb::Quit => &[
            "* Syntax: QUIT",
            "* QUIT Command does not accept arguments",
            "* Function: Terminate connection and close the transmission channel",
        ],
    }
}
