use serde::Serialize;
use crate::types::Type;

/// One capturing group, numbered in capture order from 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CaptureGroup {
    pub index: usize,
    pub name: Option<String>,
    /// Index of the innermost enclosing capturing group.
    pub parent: Option<usize>,
    /// Id of the innermost alternation the group sits in, looking through
    /// enclosing groups.
    pub alternation: Option<usize>,
    /// May be unset while the parent group (or the whole match, for
    /// top-level groups) is set.
    pub optional_within_parent: bool,
    /// Below a quantifier that allows zero repetitions, at any depth.
    pub in_optional_quantification: bool,
    /// Declared inside a `(?|...)` branch-reset group.
    pub resets_group_counter: bool,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl CaptureGroup {
    pub fn is_top_level(&self) -> bool { self.parent.is_none() }
}

/// A `|` with at least two branches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Alternation {
    pub id: usize,
    pub branch_count: usize,
    /// Whether the alternation as a whole may not participate in a match.
    pub optional: bool,
    /// Per branch that declares groups, the indices of the groups it sets.
    pub combinations: Vec<Vec<usize>>,
}

/// Capture groups of one pattern, ordered by index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupList {
    groups: Vec<CaptureGroup>,
}

impl GroupList {
    pub(crate) fn new(groups: Vec<CaptureGroup>) -> Self {
        Self { groups }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaptureGroup> { self.groups.iter() }
    pub fn len(&self) -> usize { self.groups.len() }
    pub fn is_empty(&self) -> bool { self.groups.is_empty() }

    pub fn get(&self, index: usize) -> Option<&CaptureGroup> {
        index.checked_sub(1).and_then(|i| self.groups.get(i))
    }

    pub fn is_optional(&self, group: &CaptureGroup) -> bool {
        self.is_optional_where(group, |_| None)
    }

    /// Optionality with some groups' answer pinned by `forced`. A group is
    /// optional when it is optional within its parent or its parent is.
    pub fn is_optional_where<F>(&self, group: &CaptureGroup, forced: F) -> bool
    where
        F: Fn(&CaptureGroup) -> Option<bool>,
    {
        let mut current = group;
        loop {
            if let Some(optional) = forced(current) {
                return optional;
            }
            if current.optional_within_parent {
                return true;
            }
            match current.parent.and_then(|parent| self.get(parent)) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// How many groups at the end of the list may be missing from a match
    /// result. The runtime only drops a suffix of unset groups.
    pub fn trailing_optionals(&self) -> usize {
        self.groups.iter().rev().take_while(|g| self.is_optional(g)).count()
    }
}

impl<'a> IntoIterator for &'a GroupList {
    type Item = &'a CaptureGroup;
    type IntoIter = std::slice::Iter<'a, CaptureGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Everything the shape matcher needs to know about a pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedPattern {
    pub groups: GroupList,
    pub alternations: Vec<Alternation>,
    /// Names of `(*MARK)` verbs, first occurrence order.
    pub marks: Vec<String>,
}

impl ParsedPattern {
    pub fn alternation(&self, id: usize) -> Option<&Alternation> {
        self.alternations.iter().find(|alt| alt.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(index: usize, optional: bool) -> CaptureGroup {
        CaptureGroup {
            index,
            name: None,
            parent: None,
            alternation: None,
            optional_within_parent: optional,
            in_optional_quantification: optional,
            resets_group_counter: false,
            ty: Type::string(),
        }
    }

    #[test]
    fn trailing_optionals_count_only_a_suffix() {
        let list = GroupList::new(vec![group(1, false), group(2, true), group(3, true)]);
        assert_eq!(list.trailing_optionals(), 2);
        let list = GroupList::new(vec![group(1, true), group(2, false), group(3, true)]);
        assert_eq!(list.trailing_optionals(), 1);
        assert_eq!(GroupList::default().trailing_optionals(), 0);
    }

    #[test]
    fn optionality_is_inherited_from_parents() {
        let child = CaptureGroup { parent: Some(1), ..group(2, false) };
        let list = GroupList::new(vec![group(1, true), child.clone()]);
        assert!(list.is_optional(&child));
        // pinning the parent as present makes the child required again
        assert!(!list.is_optional_where(&child, |g| (g.index == 1).then_some(false)));
        assert!(list.get(0).is_none());
        assert_eq!(list.get(2), Some(&child));
    }
}
