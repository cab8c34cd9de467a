//! Capture-group model for PHP (PCRE) pattern literals.
//!
//! A pattern is taken apart in three steps:
//! 1. split `/body/modifiers` into body and options,
//! 2. parse the body into a small syntax tree ([`ast::Node`]),
//! 3. walk the tree into numbered [`CaptureGroup`]s, [`Alternation`]s and
//!    `(*MARK)` names.
pub mod ast;
pub mod group;
pub mod parser;
mod walk;

use serde::{Deserialize, Serialize};
use tracing::trace;
use crate::error::PatternError;

pub use group::{Alternation, CaptureGroup, GroupList, ParsedPattern};
pub use parser::Options;

/// How precisely group values are typed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GroupTyping {
    /// Finite literal sets, `numeric-string` and `non-empty-string` where
    /// the group's content allows it.
    #[default]
    Refined,
    /// Every group is `string`.
    Plain,
}

/// Split a delimited pattern into its body and trailing modifiers.
pub fn split_delimiters(pattern: &str) -> Result<(&str, &str), PatternError> {
    let trimmed = pattern.trim_start();
    let mut chars = trimmed.char_indices();
    let Some((_, open)) = chars.next() else {
        return Err(PatternError::Empty);
    };
    if open.is_alphanumeric() || open == '\\' || open.is_whitespace() || open == '\0' {
        return Err(PatternError::InvalidDelimiter(open));
    }
    let close = match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    };
    let body_start = open.len_utf8();
    let mut depth = 0usize;
    while let Some((at, ch)) = chars.next() {
        if ch == '\\' {
            chars.next();
        } else if ch == close && depth == 0 {
            return Ok((&trimmed[body_start..at], &trimmed[at + ch.len_utf8()..]));
        } else if ch == close {
            depth -= 1;
        } else if ch == open && open != close {
            depth += 1;
        }
    }
    Err(PatternError::MissingEndDelimiter(close))
}

/// Translate trailing modifiers into parser options.
pub fn parse_modifiers(modifiers: &str) -> Result<Options, PatternError> {
    let mut options = Options::default();
    for modifier in modifiers.chars() {
        match modifier {
            'i' => options.caseless = true,
            'x' => options.extended = true,
            'n' => options.no_auto_capture = true,
            'J' => options.dup_names = true,
            'm' | 's' | 'u' | 'U' | 'X' | 'A' | 'D' | 'S' | ' ' | '\n' | '\r' => {}
            other => return Err(PatternError::UnknownModifier(other)),
        }
    }
    Ok(options)
}

/// Parse a delimited pattern into its capture-group model.
pub fn parse_groups(pattern: &str, typing: GroupTyping) -> Result<ParsedPattern, PatternError> {
    let (body, modifiers) = split_delimiters(pattern)?;
    let options = parse_modifiers(modifiers)?;
    let mut parser = parser::Parser::new(body, options);
    let root = parser.parse()?;
    let walked = walk::Walker::new(typing).run(&root);
    trace!(
        pattern,
        groups = walked.groups.len(),
        alternations = walked.alternations.len(),
        "parsed capture groups"
    );
    debug_assert_eq!(walked.groups.len(), parser.group_count());
    debug_assert!(parser.names().keys().all(|name| {
        walked.groups.iter().any(|group| group.name.as_deref() == Some(name.as_str()))
    }));
    Ok(ParsedPattern {
        groups: GroupList::new(walked.groups),
        alternations: walked.alternations,
        marks: walked.marks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parsed(pattern: &str) -> ParsedPattern {
        parse_groups(pattern, GroupTyping::Refined).unwrap()
    }

    fn types(pattern: &str) -> Vec<String> {
        parsed(pattern).groups.iter().map(|g| g.ty.to_string()).collect()
    }

    #[test]
    fn delimiters() {
        assert_eq!(split_delimiters("/a\\/b/i"), Ok(("a\\/b", "i")));
        assert_eq!(split_delimiters("  #x#"), Ok(("x", "")));
        assert_eq!(split_delimiters("{a{1,2}}u"), Ok(("a{1,2}", "u")));
        assert_eq!(split_delimiters("(a(b))"), Ok(("a(b)", "")));
        assert_eq!(split_delimiters(""), Err(PatternError::Empty));
        assert_eq!(split_delimiters("abc"), Err(PatternError::InvalidDelimiter('a')));
        assert_eq!(split_delimiters("/abc"), Err(PatternError::MissingEndDelimiter('/')));
        assert_eq!(split_delimiters("[abc"), Err(PatternError::MissingEndDelimiter(']')));
    }

    #[test]
    fn modifiers() {
        assert_eq!(parse_modifiers("imsxu\n").map(|o| (o.caseless, o.extended)), Ok((true, true)));
        assert_eq!(parse_modifiers("e"), Err(PatternError::UnknownModifier('e')));
        assert_eq!(parse_groups("/a/q", GroupTyping::Refined), Err(PatternError::UnknownModifier('q')));
    }

    #[test]
    fn group_value_types() {
        assert_eq!(types("/(a)(\\d+)(\\w+)(.*)/"), vec!["'a'", "numeric-string", "non-empty-string", "string"]);
        assert_eq!(types("/(£|€)(ab?)(x{2})/u"), vec!["'£'|'€'", "'a'|'ab'", "'xx'"]);
        assert_eq!(types("/([0-9]{4})-(\\d\\d)/"), vec!["numeric-string", "numeric-string"]);
        assert_eq!(types("/(a)/i"), vec!["non-empty-string"]);
        assert_eq!(types("/()(?=x)/"), vec!["''"]);
        let plain = parse_groups("/(a)(\\d+)/", GroupTyping::Plain).unwrap();
        assert!(plain.groups.iter().all(|g| g.ty == crate::types::Type::string()));
    }

    #[test]
    fn optionality_and_nesting() {
        let p = parsed("/(a)(b)?(c(d)?)*/");
        let g: Vec<_> = p.groups.iter().collect();
        assert!(!p.groups.is_optional(g[0]));
        assert!(p.groups.is_optional(g[1]));
        assert!(p.groups.is_optional(g[2]));
        assert!(g[2].in_optional_quantification);
        assert_eq!(g[3].parent, Some(3));
        assert!(g[3].optional_within_parent);
        assert!(!g[3].is_top_level());
        assert_eq!(p.groups.trailing_optionals(), 3);
    }

    #[test]
    fn alternations_record_branch_combinations() {
        let p = parsed("/(a(b))|(c)|d/");
        assert_eq!(p.alternations.len(), 1);
        let alt = &p.alternations[0];
        assert_eq!(alt.branch_count, 3);
        assert_eq!(alt.combinations, vec![vec![1, 2], vec![3]]);
        assert!(p.groups.iter().all(|g| g.alternation == Some(1)));
        // the nested group is required whenever its parent is set
        let nested = p.groups.get(2).unwrap();
        assert!(!nested.optional_within_parent);
        assert!(p.groups.is_optional(nested));
    }

    #[test]
    fn quantified_groups_do_not_define_a_branch() {
        let p = parsed("/(a)|(b)?/");
        assert_eq!(p.alternations[0].combinations, vec![vec![1]]);
    }

    #[test]
    fn branch_reset_merges_groups() {
        let p = parsed("/(?|(a)|(b)(c))/");
        assert_eq!(p.groups.len(), 2);
        let first = p.groups.get(1).unwrap();
        assert_eq!(first.ty.to_string(), "'a'|'b'");
        assert!(!p.groups.is_optional(first));
        assert!(first.resets_group_counter);
        assert!(p.groups.is_optional(p.groups.get(2).unwrap()));
        assert!(p.alternations.is_empty());
    }

    #[test]
    fn named_groups_and_marks() {
        let p = parsed("/(?<year>\\d{4})-(?P<month>\\d\\d)(*MARK:A)|(*:B)x|(*MARK:A)y/");
        let names: Vec<_> = p.groups.iter().map(|g| g.name.clone()).collect();
        assert_eq!(names, vec![Some("year".to_string()), Some("month".to_string())]);
        assert_eq!(p.marks, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn negative_lookaround_groups_are_optional() {
        let p = parsed("/x(?!(a))/");
        assert!(p.groups.is_optional(p.groups.get(1).unwrap()));
        // and never define what a branch sets
        let p = parsed("/(a)|(?!(x))(b)|(?<!(y))c/");
        assert_eq!(p.alternations[0].combinations, vec![vec![1], vec![3]]);
    }

    #[test]
    fn parse_failures_surface() {
        assert_eq!(parse_groups("/(a/", GroupTyping::Refined), Err(PatternError::UnclosedGroup(0)));
        assert!(parse_groups("/(?1)/", GroupTyping::Refined).is_err());
    }
}
