use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Refinements of `string`, ordered from narrowest to widest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrKind {
    Numeric,
    NonEmpty,
    Any,
}

// leading/trailing whitespace is allowed since PHP 8
static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t\n\r\x0B\x0C]*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?[ \t\n\r\x0B\x0C]*$")
        .expect("numeric-string grammar is a valid regex")
});

impl StrKind {
    pub fn meet(self, other: Self) -> Self { self.min(other) }

    pub fn accepts(self, s: &str) -> bool {
        match self {
            StrKind::Any => true,
            StrKind::NonEmpty => !s.is_empty(),
            StrKind::Numeric => is_numeric(s),
        }
    }
}

impl fmt::Display for StrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrKind::Numeric => "numeric-string",
            StrKind::NonEmpty => "non-empty-string",
            StrKind::Any => "string",
        })
    }
}

pub fn is_numeric(s: &str) -> bool {
    NUMERIC.is_match(s)
}

pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
