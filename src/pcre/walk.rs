//! AST → capture-group model.
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use crate::types::Type;
use super::ast::{ClassKind, GroupKind, Node, Verb};
use super::group::{Alternation, CaptureGroup};
use super::GroupTyping;

/// Finite literal sets larger than this are widened.
const LITERAL_LIMIT: usize = 8;

#[derive(Clone, Copy, Debug, Default)]
struct Context {
    parent: Option<usize>,
    /// Innermost enclosing alternation as `(id, branch)`.
    alternation: Option<(usize, usize)>,
    optional_since_parent: bool,
    optional_anywhere: bool,
    quantified: bool,
    quantified_since_alternation: bool,
    /// Inside a negative lookaround: groups here never keep a value.
    negated: bool,
    resets_group_counter: bool,
}

pub(crate) struct Walker {
    typing: GroupTyping,
    groups: BTreeMap<usize, CaptureGroup>,
    alternations: Vec<Alternation>,
    marks: Vec<String>,
}

pub(crate) struct Walked {
    pub groups: Vec<CaptureGroup>,
    pub alternations: Vec<Alternation>,
    pub marks: Vec<String>,
}

impl Walker {
    pub fn new(typing: GroupTyping) -> Self {
        Self {
            typing,
            groups: BTreeMap::new(),
            alternations: Vec::new(),
            marks: Vec::new(),
        }
    }

    pub fn run(mut self, root: &Node) -> Walked {
        self.walk(root, Context::default());
        for alternation in &mut self.alternations {
            alternation.combinations.retain(|combo| !combo.is_empty());
        }
        Walked {
            groups: self.groups.into_values().collect(),
            alternations: self.alternations,
            marks: self.marks,
        }
    }

    fn walk(&mut self, node: &Node, ctx: Context) {
        match node {
            Node::Empty | Node::Literal { .. } | Node::Class(_) | Node::Assertion | Node::Backref => {}
            Node::Verb(Verb::Mark(name)) => {
                if !self.marks.contains(name) {
                    self.marks.push(name.clone());
                }
            }
            Node::Verb(Verb::Control) => {}
            Node::Concat(items) => {
                for item in items {
                    self.walk(item, ctx);
                }
            }
            Node::Alternation(branches) => {
                let id = self.alternations.len() + 1;
                self.alternations.push(Alternation {
                    id,
                    branch_count: branches.len(),
                    optional: ctx.optional_anywhere,
                    combinations: vec![Vec::new(); branches.len()],
                });
                for (branch, item) in branches.iter().enumerate() {
                    let inner = Context {
                        alternation: Some((id, branch)),
                        optional_since_parent: true,
                        optional_anywhere: true,
                        quantified_since_alternation: false,
                        ..ctx
                    };
                    self.walk(item, inner);
                }
            }
            Node::Repeat { node, min, max } => {
                let ctx = if *min == 0 || *max == Some(0) {
                    Context {
                        optional_since_parent: true,
                        optional_anywhere: true,
                        quantified: true,
                        quantified_since_alternation: true,
                        ..ctx
                    }
                } else {
                    ctx
                };
                self.walk(node, ctx);
            }
            Node::Group { kind, node } => match kind {
                GroupKind::Capture { index, name } => {
                    self.add_group(*index, name.clone(), node, ctx);
                    let inner = Context { parent: Some(*index), optional_since_parent: false, ..ctx };
                    self.walk(node, inner);
                }
                GroupKind::NonCapture | GroupKind::Atomic | GroupKind::Look { negative: false } => {
                    self.walk(node, ctx);
                }
                // groups in a negative assertion are never set
                GroupKind::Look { negative: true } => {
                    let inner = Context {
                        optional_since_parent: true,
                        optional_anywhere: true,
                        negated: true,
                        ..ctx
                    };
                    self.walk(node, inner);
                }
                GroupKind::BranchReset => self.walk_branch_reset(node, ctx),
            },
        }
    }

    fn add_group(&mut self, index: usize, name: Option<String>, node: &Node, ctx: Context) {
        if let Some((id, branch)) = ctx.alternation {
            if !ctx.quantified_since_alternation && !ctx.negated {
                let combo = self.alternations.get_mut(id - 1).and_then(|alt| alt.combinations.get_mut(branch));
                if let Some(combo) = combo {
                    if !combo.contains(&index) {
                        combo.push(index);
                    }
                }
            }
        }
        let group = CaptureGroup {
            index,
            name,
            parent: ctx.parent,
            alternation: ctx.alternation.map(|(id, _)| id),
            optional_within_parent: ctx.optional_since_parent,
            in_optional_quantification: ctx.quantified,
            resets_group_counter: ctx.resets_group_counter,
            ty: self.typing.group_type(node),
        };
        self.groups.insert(index, group);
    }

    /// Branches of `(?|...)` share group numbers; a number set in only some
    /// branches is optional, and its type covers every branch.
    fn walk_branch_reset(&mut self, node: &Node, ctx: Context) {
        let branches: Vec<&Node> = match node {
            Node::Alternation(branches) => branches.iter().collect(),
            other => vec![other],
        };
        let ctx = Context { resets_group_counter: true, ..ctx };
        let outer = std::mem::take(&mut self.groups);
        let mut per_branch = Vec::with_capacity(branches.len());
        for branch in &branches {
            self.walk(branch, ctx);
            per_branch.push(std::mem::take(&mut self.groups));
        }
        self.groups = outer;

        let mut merged: BTreeMap<usize, (CaptureGroup, usize)> = BTreeMap::new();
        for groups in per_branch {
            for (index, group) in groups {
                match merged.entry(index) {
                    Entry::Vacant(slot) => {
                        slot.insert((group, 1));
                    }
                    Entry::Occupied(mut slot) => {
                        let (seen, count) = slot.get_mut();
                        *count += 1;
                        seen.ty = Type::union([seen.ty.clone(), group.ty]);
                        seen.optional_within_parent |= group.optional_within_parent;
                        seen.in_optional_quantification |= group.in_optional_quantification;
                        if seen.name.is_none() {
                            seen.name = group.name;
                        }
                    }
                }
            }
        }
        for (index, (mut group, count)) in merged {
            if count < branches.len() {
                group.optional_within_parent = true;
            }
            self.groups.insert(index, group);
        }
    }
}

// ---- Group value typing ---- //

/// What is statically known about the text a node matches.
#[derive(Clone, Debug)]
struct Facts {
    min_len: usize,
    /// Exact set of possible matches, when small and known.
    literals: Option<BTreeSet<String>>,
    digits_only: bool,
}

impl Facts {
    fn empty() -> Self {
        Self { min_len: 0, literals: Some(BTreeSet::from([String::new()])), digits_only: true }
    }

    fn unknown(min_len: usize, digits_only: bool) -> Self {
        Self { min_len, literals: None, digits_only }
    }

    fn then(self, next: Facts) -> Facts {
        let literals = match (self.literals, next.literals) {
            (Some(a), Some(b)) if a.len() * b.len() <= LITERAL_LIMIT => {
                Some(a.iter().flat_map(|x| b.iter().map(move |y| format!("{x}{y}"))).collect())
            }
            _ => None,
        };
        Facts {
            min_len: self.min_len.saturating_add(next.min_len),
            literals,
            digits_only: self.digits_only && next.digits_only,
        }
    }

    fn or(self, other: Facts) -> Facts {
        let literals = match (self.literals, other.literals) {
            (Some(mut a), Some(b)) => {
                a.extend(b);
                (a.len() <= LITERAL_LIMIT).then_some(a)
            }
            _ => None,
        };
        Facts {
            min_len: self.min_len.min(other.min_len),
            literals,
            digits_only: self.digits_only && other.digits_only,
        }
    }

    fn repeat(self, min: u32, max: Option<u32>) -> Facts {
        let min_len = self.min_len.saturating_mul(min as usize);
        let digits_only = self.digits_only;
        let literals = match (min, max) {
            (_, Some(0)) => Some(BTreeSet::from([String::new()])),
            (0, Some(1)) => self.literals.map(|mut set| {
                set.insert(String::new());
                set
            }),
            (n, Some(m)) if n == m && n <= 4 => {
                let once = Facts { literals: self.literals, ..Facts::empty() };
                let mut acc = Facts::empty();
                for _ in 0..n {
                    acc = acc.then(once.clone());
                }
                acc.literals
            }
            _ => None,
        }
        .filter(|set| set.len() <= LITERAL_LIMIT);
        Facts { min_len, literals, digits_only }
    }
}

fn facts(node: &Node) -> Facts {
    match node {
        Node::Empty | Node::Assertion | Node::Verb(_) => Facts::empty(),
        Node::Literal { ch, caseless } => Facts {
            min_len: 1,
            literals: (!caseless).then(|| BTreeSet::from([ch.to_string()])),
            digits_only: ch.is_ascii_digit(),
        },
        Node::Class(kind) => Facts::unknown(1, *kind == ClassKind::Digit),
        Node::Backref => Facts::unknown(0, false),
        Node::Concat(items) => items.iter().map(facts).fold(Facts::empty(), Facts::then),
        Node::Alternation(branches) => branches.iter().map(facts).reduce(Facts::or).unwrap_or_else(Facts::empty),
        Node::Repeat { node, min, max } => facts(node).repeat(*min, *max),
        Node::Group { kind: GroupKind::Look { .. }, .. } => Facts::empty(),
        Node::Group { node, .. } => facts(node),
    }
}

impl GroupTyping {
    /// Value type of a group that took part in the match.
    pub fn group_type(self, node: &Node) -> Type {
        match self {
            GroupTyping::Plain => Type::string(),
            GroupTyping::Refined => {
                let facts = facts(node);
                if let Some(literals) = facts.literals {
                    return Type::union(literals.into_iter().map(Type::constant_string));
                }
                match (facts.min_len, facts.digits_only) {
                    (0, _) => Type::string(),
                    (_, true) => Type::numeric_string(),
                    (_, false) => Type::non_empty_string(),
                }
            }
        }
    }
}
