//! Evaluate many call sites at once.
//!
//! A case file is either a JSON array of [`Case`]s or NDJSON with one case
//! per line. Cases are independent, so they are evaluated on the rayon
//! pool; outcomes keep the input order.
use std::path::Path;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::BatchError;
use crate::expr::{Expr, MapScope};
use crate::matcher::{MatchMode, RegexShapeMatcher};
use crate::path_de::{from_line_with_path, from_str_with_path};
use crate::trinary::Trinary;
use crate::types::Type;

/// One `preg_match` / `preg_match_all` call site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    #[serde(default)]
    pub name: String,
    /// A pattern literal, or every literal the pattern argument may hold.
    pub pattern: PatternInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<FlagsInput>,
    #[serde(default)]
    pub mode: MatchMode,
    /// Whether the call is known to have returned a match.
    #[serde(default = "matched_by_default")]
    pub matched: Trinary,
}

fn matched_by_default() -> Trinary {
    Trinary::Yes
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternInput {
    One(String),
    Many(Vec<String>),
}

/// Either the integer value or a PHP expression such as
/// `PREG_SET_ORDER | PREG_OFFSET_CAPTURE`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagsInput {
    Int(i64),
    Expr(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    /// `None` when no precise type is known.
    #[serde(rename = "type")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PatternInput {
    fn to_type(&self) -> Type {
        match self {
            PatternInput::One(pattern) => Type::constant_string(pattern.as_str()),
            PatternInput::Many(patterns) => {
                Type::union(patterns.iter().map(|p| Type::constant_string(p.as_str())))
            }
        }
    }
}

impl FlagsInput {
    fn to_expr(&self) -> Option<Expr> {
        match self {
            FlagsInput::Int(value) => Some(Expr::Int(*value)),
            FlagsInput::Expr(src) => Expr::parse_flags(src),
        }
    }
}

impl Case {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: PatternInput::One(pattern.into()),
            flags: None,
            mode: MatchMode::One,
            matched: Trinary::Yes,
        }
    }

    pub fn with_flags(mut self, flags: FlagsInput) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_matched(mut self, matched: Trinary) -> Self {
        self.matched = matched;
        self
    }
}

// ---- Evaluation ---- //

pub fn run_case(matcher: &RegexShapeMatcher, case: &Case) -> Outcome {
    let outcome = |ty: Option<String>, error: Option<String>| Outcome {
        name: case.name.clone(),
        ty,
        error,
    };
    let scope = MapScope::new().with_var("pattern", case.pattern.to_type());
    let pattern = Expr::var("pattern");
    let flags = match &case.flags {
        None => None,
        Some(input) => match input.to_expr() {
            Some(expr) => Some(expr),
            None => return outcome(None, Some(format!("cannot read flags expression {input:?}"))),
        },
    };
    let result = match case.mode {
        MatchMode::One => matcher.match_expr(&pattern, flags.as_ref(), case.matched, &scope),
        MatchMode::All => matcher.match_all_expr(&pattern, flags.as_ref(), case.matched, &scope),
    };
    match result {
        Ok(ty) => outcome(ty.map(|ty| ty.to_string()), None),
        Err(error) => outcome(None, Some(error.to_string())),
    }
}

/// Evaluate every case in parallel. Unnamed cases are named by their
/// 1-based position.
pub fn run_cases(matcher: &RegexShapeMatcher, cases: &[Case]) -> Vec<Outcome> {
    cases
        .par_iter()
        .enumerate()
        .map(|(i, case)| {
            let mut outcome = run_case(matcher, case);
            if outcome.name.is_empty() {
                outcome.name = format!("case-{}", i + 1);
            }
            outcome
        })
        .collect()
}

// ---- Loading ---- //

/// Parse a case file. With `ndjson`, blank lines are skipped.
pub fn parse_cases(src: &str, ndjson: bool) -> Result<Vec<Case>, String> {
    if !ndjson {
        return from_str_with_path(src);
    }
    src.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| from_line_with_path(line, i + 1))
        .collect()
}

pub fn load_cases(path: impl AsRef<Path>, ndjson: bool) -> Result<Vec<Case>, BatchError> {
    let path = path.as_ref();
    let src = std::fs::read_to_string(path).map_err(|source| BatchError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cases = parse_cases(&src, ndjson).map_err(|message| BatchError::Parse {
        path: path.display().to_string(),
        message,
    })?;
    debug!(path = %path.display(), cases = cases.len(), "loaded cases");
    Ok(cases)
}
