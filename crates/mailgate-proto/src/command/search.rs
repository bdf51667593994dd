//! SEARCH argument grammar.
//!
//! ```text
//! search = key "=" "[" value "]"
//! key    = "ALL" / "BODY" / "SUBJECT" / "SENDER" / "RECIPIENT" / "SINCE" / "UNTIL"
//! ```
//!
//! The whole remainder of the line is one argument, so the bracketed value
//! may contain spaces. SINCE and UNTIL take a `yyyy-MM-dd` date.

use chrono::NaiveDate;

/// Date format for SINCE and UNTIL.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single searchable message field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    /// Message body.
    Body,
    /// Subject line.
    Subject,
    /// Sender address.
    Sender,
    /// Recipient addresses.
    Recipient,
}

impl SearchField {
    /// All fields.
    pub const ALL: [Self; 4] = [Self::Body, Self::Subject, Self::Sender, Self::Recipient];
}

/// A parsed SEARCH request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Substring of any text field.
    All(String),
    /// Substring of one field.
    Field(SearchField, String),
    /// Dated on or after.
    Since(NaiveDate),
    /// Dated on or before.
    Until(NaiveDate),
}

/// Why a SEARCH line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// No `KEY=VALUE` pair.
    Arguments,
    /// Value not wrapped in brackets.
    Brackets,
    /// Unknown key.
    Key,
    /// SINCE/UNTIL value is not a date.
    Date,
}

impl SearchError {
    /// Client-facing text, without the `BAD ` prefix.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Arguments => "Parsing Arguments Error!",
            Self::Brackets => "Search value must start with \"[\" and end with \"]\"",
            Self::Key => "Search key is not valid!",
            Self::Date => "Parsing Date failed",
        }
    }
}

/// Parses SEARCH arguments.
///
/// # Errors
///
/// Checks run in order: pair shape, brackets, key, date.
pub fn parse(args: &str) -> Result<SearchQuery, SearchError> {
    let (key, value) = args.trim().split_once('=').ok_or(SearchError::Arguments)?;
    let key = key.trim().to_ascii_uppercase();
    let value = value
        .trim()
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(SearchError::Brackets)?;

    match key.as_str() {
        "ALL" => Ok(SearchQuery::All(value.to_string())),
        "BODY" => Ok(SearchQuery::Field(SearchField::Body, value.to_string())),
        "SUBJECT" => Ok(SearchQuery::Field(SearchField::Subject, value.to_string())),
        "SENDER" => Ok(SearchQuery::Field(SearchField::Sender, value.to_string())),
        "RECIPIENT" => Ok(SearchQuery::Field(SearchField::Recipient, value.to_string())),
        "SINCE" => parse_date(value).map(SearchQuery::Since),
        "UNTIL" => parse_date(value).map(SearchQuery::Until),
        _ => Err(SearchError::Key),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, SearchError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| SearchError::Date)
}
