//! Detects the group layouts that allow a tagged union instead of a
//! single shape.
use std::collections::BTreeSet;
use tracing::trace;
use crate::error::ShapeError;
use crate::pcre::{Alternation, CaptureGroup, GroupList, ParsedPattern};
use crate::trinary::Trinary;
use crate::types::Type;
use super::build::{Override, Overrides};
use super::MatchMode;

#[derive(Debug)]
pub(crate) enum Classification<'a> {
    /// Exactly one top-level group, and it is optional.
    LoneOptionalGroup(&'a CaptureGroup),
    /// Every top-level group sits in the same unquantified alternation.
    LoneAlternation(&'a Alternation),
    General,
}

pub(crate) fn classify<'a>(
    parsed: &'a ParsedPattern,
    mode: MatchMode,
    was_matched: Trinary,
) -> Result<Classification<'a>, ShapeError> {
    if mode == MatchMode::All {
        return Ok(Classification::General);
    }
    let lone_optional = only_optional_top_level_group(&parsed.groups);
    if let Some(group) = lone_optional {
        if was_matched.yes() {
            trace!(group = group.index, "lone optional top-level group");
            return Ok(Classification::LoneOptionalGroup(group));
        }
        return Ok(Classification::General);
    }
    if was_matched.no() {
        return Ok(Classification::General);
    }
    let Some(id) = only_top_level_alternation(&parsed.groups) else {
        return Ok(Classification::General);
    };
    let alternation = parsed.alternation(id)
        .ok_or_else(|| ShapeError::Invariant(format!("alternation {id} is referenced but not recorded")))?;
    trace!(alternation = id, branches = alternation.branch_count, "lone top-level alternation");
    Ok(Classification::LoneAlternation(alternation))
}

fn only_optional_top_level_group(groups: &GroupList) -> Option<&CaptureGroup> {
    let mut found = None;
    for group in groups.iter().filter(|g| g.is_top_level()) {
        if !groups.is_optional(group) || found.is_some() {
            return None;
        }
        found = Some(group);
    }
    found
}

fn only_top_level_alternation(groups: &GroupList) -> Option<usize> {
    let mut found = None;
    for group in groups.iter().filter(|g| g.is_top_level()) {
        let id = group.alternation?;
        if group.in_optional_quantification {
            return None;
        }
        match found {
            None => found = Some(id),
            Some(existing) if existing != id => return None,
            Some(_) => {}
        }
    }
    found
}

/// Overrides for the branch of `alternation` that sets `combo`.
///
/// Groups numbered before the branch's last group are always reported (as
/// `''`, or `null` under unmatched-as-null), since PCRE fills every slot up
/// to the highest group set. Other groups of the alternation, and everything
/// nested in them, do not exist in this branch.
pub(crate) fn branch_overrides(
    groups: &GroupList,
    alternation: &Alternation,
    combo: &[usize],
    unmatched_as_null: bool,
) -> Result<Overrides, ShapeError> {
    if let Some(missing) = combo.iter().find(|&&index| groups.get(index).is_none()) {
        return Err(ShapeError::Invariant(format!(
            "alternation {} names group {missing}, which does not exist",
            alternation.id
        )));
    }
    let Some(last) = combo.iter().copied().max() else {
        return Err(ShapeError::Invariant(format!("alternation {} has an empty branch combination", alternation.id)));
    };
    let filler = if unmatched_as_null { Type::Null } else { Type::constant_string("") };
    let absent = || if unmatched_as_null { Override::Fixed(Type::Null) } else { Override::Removed };
    let mut overrides = Overrides::new();
    let mut dropped = BTreeSet::new();
    for group in groups {
        if combo.contains(&group.index) {
            overrides.set(group.index, Override::Matched);
        } else if descends_from(groups, group, |parent| combo.contains(&parent)) {
            continue;
        } else if group.index < last {
            overrides.set(group.index, Override::Fixed(filler.clone()));
        } else if group.alternation == Some(alternation.id)
            || descends_from(groups, group, |parent| dropped.contains(&parent))
        {
            dropped.insert(group.index);
            overrides.set(group.index, absent());
        }
    }
    Ok(overrides)
}

/// Overrides for a match that sets no group at all.
pub(crate) fn all_unset(groups: &GroupList) -> Overrides {
    groups.iter().fold(Overrides::new(), |overrides, group| {
        overrides.with(group.index, Override::Fixed(Type::Null))
    })
}

fn descends_from(groups: &GroupList, group: &CaptureGroup, is_ancestor: impl Fn(usize) -> bool) -> bool {
    let mut parent = group.parent;
    while let Some(index) = parent {
        if is_ancestor(index) {
            return true;
        }
        parent = groups.get(index).and_then(|g| g.parent);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcre::{parse_groups, GroupTyping};

    fn parsed(pattern: &str) -> ParsedPattern {
        parse_groups(pattern, GroupTyping::Refined).unwrap()
    }

    fn kind(pattern: &str, mode: MatchMode, was_matched: Trinary) -> &'static str {
        let p = parsed(pattern);
        match classify(&p, mode, was_matched).unwrap() {
            Classification::LoneOptionalGroup(_) => "optional-group",
            Classification::LoneAlternation(_) => "alternation",
            Classification::General => "general",
        }
    }

    #[test]
    fn lone_optional_group_needs_a_known_match() {
        assert_eq!(kind("/(a)?/", MatchMode::One, Trinary::Yes), "optional-group");
        assert_eq!(kind("/x(?:(a)(b))?/", MatchMode::One, Trinary::Yes), "general");
        assert_eq!(kind("/(a)?/", MatchMode::One, Trinary::Maybe), "general");
        assert_eq!(kind("/(a)?/", MatchMode::All, Trinary::Yes), "general");
        assert_eq!(kind("/(a)?(b)?/", MatchMode::One, Trinary::Yes), "general");
        assert_eq!(kind("/(a)?(b)/", MatchMode::One, Trinary::Yes), "general");
        // nested groups do not count as top-level
        assert_eq!(kind("/(a(b))?/", MatchMode::One, Trinary::Yes), "optional-group");
    }

    #[test]
    fn lone_alternation() {
        assert_eq!(kind("/(a)|(b)/", MatchMode::One, Trinary::Yes), "alternation");
        assert_eq!(kind("/(a)|(b)/", MatchMode::One, Trinary::Maybe), "alternation");
        assert_eq!(kind("/(a)|(b)/", MatchMode::One, Trinary::No), "general");
        assert_eq!(kind("/(a)|(b)/", MatchMode::All, Trinary::Yes), "general");
        assert_eq!(kind("/(?:(a)|(b))?/", MatchMode::One, Trinary::Yes), "general");
        assert_eq!(kind("/(?:(a)|(b))(c)/", MatchMode::One, Trinary::Yes), "general");
        // one top-level group that is optional wins over the alternation
        assert_eq!(kind("/(a)|b/", MatchMode::One, Trinary::Yes), "optional-group");
        assert_eq!(kind("/(a)|b/", MatchMode::One, Trinary::Maybe), "general");
    }

    #[test]
    fn branch_overrides_pin_earlier_groups_and_drop_siblings() {
        let p = parsed("/(a(b))|(c)|(d)/");
        let alt = &p.alternations[0];
        let second = branch_overrides(&p.groups, alt, &[3], false).unwrap();
        assert_eq!(second.get(1), Some(&Override::Fixed(Type::constant_string(""))));
        assert_eq!(second.get(2), Some(&Override::Fixed(Type::constant_string(""))));
        assert_eq!(second.get(3), Some(&Override::Matched));
        assert_eq!(second.get(4), Some(&Override::Removed));

        let first = branch_overrides(&p.groups, alt, &[1, 2], true).unwrap();
        assert_eq!(first.get(3), Some(&Override::Fixed(Type::Null)));
        assert_eq!(first.get(4), Some(&Override::Fixed(Type::Null)));
    }

    #[test]
    fn groups_nested_in_the_branch_keep_their_own_optionality() {
        let p = parsed("/(a(b)?)|(c)/");
        let overrides = branch_overrides(&p.groups, &p.alternations[0], &[1], false).unwrap();
        assert_eq!(overrides.get(2), None);
        assert_eq!(overrides.get(3), Some(&Override::Removed));
    }

    #[test]
    fn unset_groups_inside_the_branch_are_padded() {
        let p = parsed("/(a)(?!(x))(b)|(c)/");
        let first = branch_overrides(&p.groups, &p.alternations[0], &[1, 3], false).unwrap();
        assert_eq!(first.get(2), Some(&Override::Fixed(Type::constant_string(""))));
        assert_eq!(first.get(4), Some(&Override::Removed));
    }

    #[test]
    fn earlier_branch_reset_groups_stay_in_place() {
        let p = parsed("/(?|(a)|(b))|(c)/");
        let second = branch_overrides(&p.groups, &p.alternations[0], &[2], false).unwrap();
        assert_eq!(second.get(1), Some(&Override::Fixed(Type::constant_string(""))));
        let with_null = branch_overrides(&p.groups, &p.alternations[0], &[2], true).unwrap();
        assert_eq!(with_null.get(1), Some(&Override::Fixed(Type::Null)));
    }

    #[test]
    fn unknown_combination_members_are_invariant_violations() {
        let p = parsed("/(a)|(b)/");
        assert!(matches!(
            branch_overrides(&p.groups, &p.alternations[0], &[7], false),
            Err(ShapeError::Invariant(_))
        ));
    }
}
