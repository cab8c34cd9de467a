//! Static result types for `preg_match` / `preg_match_all`.
//!
//! Given the static type of a pattern argument, of the flags argument, and
//! whether the call is known to have matched, predict the exact array
//! shape written to `$matches`. Three strategies are used:
//!
//! - a lone optional top-level group yields "matched without the group" ∪
//!   "matched with the group",
//! - a lone top-level alternation yields one shape per branch,
//! - anything else yields one shape that covers every outcome.
//!
//! Branch-specific assumptions about groups are passed to the builder as a
//! side table of [`build::Override`]s, so the parsed group list is never
//! modified.
mod build;
mod classify;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::config::Config;
use crate::error::ShapeError;
use crate::expr::{resolve_pattern_type, Expr, Scope};
use crate::flags::{self, MatchFlags};
use crate::pcre::{self, Alternation, CaptureGroup};
use crate::trinary::Trinary;
use crate::types::{ArrayShape, Type};
use build::{Override, Overrides, ShapeInputs};
use classify::Classification;

/// `preg_match` (one) or `preg_match_all` (all).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    One,
    All,
}

#[derive(Clone, Debug, Default)]
pub struct RegexShapeMatcher {
    config: Config,
}

impl RegexShapeMatcher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Result type of `preg_match($pattern, $subject, $matches, $flags)`.
    /// `Ok(None)` means no precise type is known.
    pub fn match_expr(
        &self,
        pattern: &Expr,
        flags: Option<&Expr>,
        was_matched: Trinary,
        scope: &dyn Scope,
    ) -> Result<Option<Type>, ShapeError> {
        self.match_expr_in_mode(pattern, flags, was_matched, scope, MatchMode::One)
    }

    /// Result type of `preg_match_all($pattern, $subject, $matches, $flags)`.
    pub fn match_all_expr(
        &self,
        pattern: &Expr,
        flags: Option<&Expr>,
        was_matched: Trinary,
        scope: &dyn Scope,
    ) -> Result<Option<Type>, ShapeError> {
        self.match_expr_in_mode(pattern, flags, was_matched, scope, MatchMode::All)
    }

    fn match_expr_in_mode(
        &self,
        pattern: &Expr,
        flags: Option<&Expr>,
        was_matched: Trinary,
        scope: &dyn Scope,
        mode: MatchMode,
    ) -> Result<Option<Type>, ShapeError> {
        let pattern_type = resolve_pattern_type(pattern, scope);
        let flags_type = flags.map(|flags| scope.type_of(flags));
        self.match_pattern_type(&pattern_type, flags_type.as_ref(), was_matched, mode)
    }

    /// Result type for every constant pattern in `pattern_type`, unioned.
    #[tracing::instrument(level = "debug", skip_all, fields(pattern = %pattern_type, ?mode, ?was_matched))]
    pub fn match_pattern_type(
        &self,
        pattern_type: &Type,
        flags_type: Option<&Type>,
        was_matched: Trinary,
        mode: MatchMode,
    ) -> Result<Option<Type>, ShapeError> {
        if was_matched.no() {
            return Ok(Some(Type::Shape(ArrayShape::empty())));
        }
        let patterns = pattern_type.constant_strings();
        if patterns.is_empty() {
            debug!("pattern is not a constant string");
            return Ok(None);
        }
        let flags = match flags::resolve(flags_type, mode) {
            Ok(flags) => flags,
            Err(reason) => {
                debug!(%reason, "flags cannot be analysed");
                return Ok(None);
            }
        };
        let mut matched = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            match self.match_regex(pattern, flags, was_matched, mode) {
                Ok(Some(ty)) => matched.push(ty),
                Ok(None) => return Ok(None),
                Err(error) => {
                    warn!(pattern, %error, "shape construction failed");
                    return Err(error);
                }
            }
        }
        Ok(Some(Type::union(matched)))
    }

    /// Result type for a single pattern literal with already validated flags.
    pub fn match_regex(
        &self,
        regex: &str,
        flags: MatchFlags,
        was_matched: Trinary,
        mode: MatchMode,
    ) -> Result<Option<Type>, ShapeError> {
        let parsed = match pcre::parse_groups(regex, self.config.group_types) {
            Ok(parsed) => parsed,
            Err(error) => {
                debug!(regex, %error, "pattern cannot be parsed");
                return Ok(None);
            }
        };
        let inputs = ShapeInputs {
            groups: &parsed.groups,
            marks: &parsed.marks,
            flags,
            was_matched,
            mode,
            unmatched_as_null: flags.unmatched_as_null(mode, self.config.php_version),
            trailing_optionals: parsed.groups.trailing_optionals(),
        };
        let ty = match classify::classify(&parsed, mode, was_matched)? {
            Classification::LoneOptionalGroup(group) => lone_optional_group(&inputs, group),
            Classification::LoneAlternation(alternation) => lone_alternation(&inputs, alternation)?,
            Classification::General => inputs.build(&Overrides::new()),
        };
        Ok(Some(ty))
    }
}

/// The group either took part (and is then always reported) or the
/// match ended before it.
fn lone_optional_group(inputs: &ShapeInputs<'_>, group: &CaptureGroup) -> Type {
    let matched = inputs.build(&Overrides::new().with(group.index, Override::Present));
    if inputs.unmatched_as_null {
        return matched;
    }
    Type::union([inputs.subject_only(), matched])
}

fn lone_alternation(inputs: &ShapeInputs<'_>, alternation: &Alternation) -> Result<Type, ShapeError> {
    let mut shapes = Vec::with_capacity(alternation.combinations.len() + 1);
    for combo in &alternation.combinations {
        let overrides = classify::branch_overrides(inputs.groups, alternation, combo, inputs.unmatched_as_null)?;
        shapes.push(inputs.build(&overrides));
    }
    // some branch sets no group at all
    let uncovered = alternation.combinations.len() != alternation.branch_count || alternation.optional;
    if uncovered {
        let fallback = if inputs.unmatched_as_null {
            inputs.build(&classify::all_unset(inputs.groups))
        } else {
            inputs.subject_only()
        };
        shapes.push(fallback);
    }
    Ok(Type::union(shapes))
}
