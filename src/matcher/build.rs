//! Result-shape construction for one group list under one set of
//! per-branch overrides.
use std::collections::BTreeMap;
use crate::flags::MatchFlags;
use crate::pcre::{CaptureGroup, GroupList};
use crate::trinary::Trinary;
use crate::types::{ArrayShape, ShapeBuilder, Type};
use super::MatchMode;

/// How a classification branch pins a group. Kept beside the group list,
/// never written into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Override {
    /// Always set in this branch.
    Present,
    /// Set by the branch being built, so never `null` either.
    Matched,
    /// Always present with exactly this value type.
    Fixed(Type),
    /// Not part of the result in this branch.
    Removed,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Overrides(BTreeMap<usize, Override>);

impl Overrides {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, index: usize, value: Override) -> Self {
        self.set(index, value);
        self
    }

    pub fn set(&mut self, index: usize, value: Override) {
        self.0.insert(index, value);
    }

    pub fn get(&self, index: usize) -> Option<&Override> {
        self.0.get(&index)
    }

    fn is_removed(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Override::Removed))
    }

    /// `Some(false)` for every group this branch pins as present.
    fn forced_optional(&self, index: usize) -> Option<bool> {
        match self.get(index) {
            Some(Override::Present | Override::Matched | Override::Fixed(_)) => Some(false),
            Some(Override::Removed) | None => None,
        }
    }
}

/// Everything besides overrides that determines a result shape.
pub(crate) struct ShapeInputs<'a> {
    pub groups: &'a GroupList,
    pub marks: &'a [String],
    pub flags: MatchFlags,
    pub was_matched: Trinary,
    pub mode: MatchMode,
    pub unmatched_as_null: bool,
    pub trailing_optionals: usize,
}

impl ShapeInputs<'_> {
    pub fn build(&self, overrides: &Overrides) -> Type {
        let mut builder = ShapeBuilder::new();
        builder.set_offset_value_type(0i64, self.subject_value_type(), self.is_subject_optional());

        let kept: Vec<&CaptureGroup> = self.groups.iter()
            .filter(|group| !overrides.is_removed(group.index))
            .collect();
        let count = kept.len();
        for (i, group) in kept.into_iter().enumerate() {
            let trailing = i + self.trailing_optionals >= count;
            let last = i + 1 == count;
            let optional_group = self.groups.is_optional_where(group, |g| overrides.forced_optional(g.index));
            let value = self.group_value_type(group, overrides.get(group.index), optional_group, trailing, last);
            let optional = self.is_group_optional(optional_group, trailing);
            // the name key precedes the index key
            if let Some(name) = &group.name {
                builder.set_offset_value_type(name.as_str(), value.clone(), optional);
            }
            builder.set_offset_value_type(group.index as i64, value, optional);
        }

        if !self.marks.is_empty() {
            let marks = Type::union(self.marks.iter().map(|mark| Type::constant_string(mark.as_str())));
            builder.set_offset_value_type("MARK", marks, true);
        }

        let shape = builder.build();
        if self.mode == MatchMode::All && self.flags.set_order() {
            let list = Type::list_of(shape);
            if self.was_matched.yes() {
                return list;
            }
            return Type::union([Type::Shape(ArrayShape::empty()), list]);
        }
        shape
    }

    /// `{0: subject}` alone: the pattern matched without setting any group.
    pub fn subject_only(&self) -> Type {
        let mut builder = ShapeBuilder::new();
        builder.set_offset_value_type(0i64, self.subject_value_type(), false);
        builder.build()
    }

    fn is_subject_optional(&self) -> bool {
        self.mode == MatchMode::One && !self.was_matched.yes()
    }

    fn subject_value_type(&self) -> Type {
        let subject = self.wrap_offset(Type::string());
        if self.mode == MatchMode::All && self.flags.pattern_order() {
            return Type::list_of(subject);
        }
        subject
    }

    fn is_group_optional(&self, optional_group: bool, trailing: bool) -> bool {
        match self.mode {
            MatchMode::All => trailing && !self.unmatched_as_null && self.flags.set_order(),
            MatchMode::One => {
                if !self.was_matched.yes() {
                    true
                } else if !trailing || self.unmatched_as_null {
                    false
                } else {
                    optional_group
                }
            }
        }
    }

    fn group_value_type(
        &self,
        group: &CaptureGroup,
        pinned: Option<&Override>,
        optional_group: bool,
        trailing: bool,
        last: bool,
    ) -> Type {
        let uan = self.unmatched_as_null;
        match (self.mode, pinned) {
            (_, Some(Override::Fixed(ty))) => self.wrap_offset(ty.clone()),
            (MatchMode::All, _) => {
                // unset groups inside a match are reported as ''
                let pad = !uan && optional_group && (self.flags.pattern_order() || !trailing);
                let nullable = uan && (trailing || optional_group);
                let value = self.value_type(group.ty.clone(), pad, nullable);
                if self.flags.pattern_order() {
                    Type::list_of(value)
                } else {
                    value
                }
            }
            (MatchMode::One, pinned) => {
                let pad = !last && !uan && optional_group;
                let always_set = self.was_matched.yes() && !trailing && !optional_group;
                let nullable = uan && !always_set && pinned != Some(&Override::Matched);
                self.value_type(group.ty.clone(), pad, nullable)
            }
        }
    }

    fn value_type(&self, base: Type, pad: bool, nullable: bool) -> Type {
        let mut value = if pad {
            Type::union([base, Type::constant_string("")])
        } else {
            base
        };
        if nullable {
            value = value.add_null();
        }
        self.wrap_offset(value)
    }

    /// With `PREG_OFFSET_CAPTURE` every value becomes `[value, offset]`;
    /// unset groups report offset -1.
    fn wrap_offset(&self, value: Type) -> Type {
        if !self.flags.offset_capture() {
            return value;
        }
        let mut pair = ShapeBuilder::new();
        pair.set_offset_value_type(0i64, value, false);
        pair.set_offset_value_type(1i64, Type::int_range(Some(-1), None), false);
        pair.build()
    }
}
