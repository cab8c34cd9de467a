//! Error types. A failure never escapes the matcher as a panic: pattern
//! and flag problems become an unknown result, configuration problems are
//! reported to the caller.
use thiserror::Error;

/// Why a pattern literal could not be turned into a capture-group model.
/// Positions are char offsets into the pattern body (after the delimiter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,
    #[error("delimiter must not be alphanumeric, backslash or whitespace: {0:?}")]
    InvalidDelimiter(char),
    #[error("no ending delimiter {0:?} found")]
    MissingEndDelimiter(char),
    #[error("unknown modifier {0:?}")]
    UnknownModifier(char),
    #[error("missing ) at {0}")]
    UnclosedGroup(usize),
    #[error("unmatched closing parenthesis at {0}")]
    UnmatchedParen(usize),
    #[error("missing terminating ] for character class at {0}")]
    UnclosedClass(usize),
    #[error("quantifier does not follow a repeatable item at {0}")]
    NothingToRepeat(usize),
    #[error("numbers out of order in {{}} quantifier at {0}")]
    QuantifierOutOfOrder(usize),
    #[error("range out of order in character class at {0}")]
    RangeOutOfOrder(usize),
    #[error("unrecognized escape sequence at {0}")]
    UnknownEscape(usize),
    #[error("pattern ends with a backslash")]
    TrailingBackslash,
    #[error("invalid group name at {0}")]
    InvalidGroupName(usize),
    #[error("two named subpatterns have the same name: {0}")]
    DuplicateGroupName(String),
    #[error("unsupported construct ({0}) at {1}")]
    Unsupported(&'static str, usize),
    #[error("(*MARK) must have an argument at {0}")]
    MarkWithoutName(usize),
    #[error("unknown backtracking verb at {0}")]
    UnknownVerb(usize),
    #[error("parentheses are too deeply nested at {0}")]
    NestingTooDeep(usize),
    #[error("unrecognized character after (? at {0}")]
    UnknownGroupSyntax(usize),
}

/// Internal inconsistency while assembling a result. Callers treat it
/// like any other unknown, but it is logged at `warn`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("invariant violated: {0}")]
    Invariant(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("invalid configuration {0}")]
    Parse(String),
    #[error("invalid PHP version {0:?}")]
    Version(String),
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("invalid case file {path}: {message}")]
    Parse { path: String, message: String },
}
