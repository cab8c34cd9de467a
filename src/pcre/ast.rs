/// Syntax tree for the PCRE subset the group model needs.
///
/// Only what influences group numbering, optionality or the value a group
/// can capture is kept; everything else collapses into `Class(Any)` or
/// `Assertion`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Empty,
    Literal { ch: char, caseless: bool },
    Class(ClassKind),
    /// Zero-width: anchors, `\b`, `\K` and friends.
    Assertion,
    /// Back-reference to an earlier group; captures unknown text.
    Backref,
    Verb(Verb),
    Concat(Vec<Node>),
    Alternation(Vec<Node>),
    Repeat { node: Box<Node>, min: u32, max: Option<u32> },
    Group { kind: GroupKind, node: Box<Node> },
}

/// What a single-character item may match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassKind {
    /// Only ASCII digits.
    Digit,
    Any,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verb {
    /// `(*MARK:name)` and its `(*:name)`, `(*PRUNE:name)`, `(*THEN:name)` spellings.
    Mark(String),
    /// Every other backtracking-control or start-of-pattern verb.
    Control,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupKind {
    Capture { index: usize, name: Option<String> },
    NonCapture,
    /// `(?|...)`: each branch numbers its groups from the same start.
    BranchReset,
    Atomic,
    Look { negative: bool },
}

impl Node {
    pub(crate) fn concat(mut nodes: Vec<Node>) -> Node {
        nodes.retain(|node| *node != Node::Empty);
        match nodes.len() {
            0 => Node::Empty,
            1 => nodes.swap_remove(0),
            _ => Node::Concat(nodes),
        }
    }

    pub(crate) fn alternation(mut branches: Vec<Node>) -> Node {
        if branches.len() == 1 {
            branches.swap_remove(0)
        } else {
            Node::Alternation(branches)
        }
    }

    /// Whether a quantifier may follow this node.
    pub(crate) fn is_repeatable(&self) -> bool {
        !matches!(self, Node::Empty | Node::Verb(_) | Node::Repeat { .. })
    }
}
