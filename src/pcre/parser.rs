//! Recursive-descent parser for pattern bodies (delimiters and trailing
//! modifiers already stripped).
use indexmap::IndexMap;
use crate::error::PatternError;
use super::ast::{ClassKind, GroupKind, Node, Verb};

/// PCRE's default limit on parenthesis nesting.
pub const NEST_LIMIT: usize = 250;

/// Options that change how the body is parsed. Set from the trailing
/// modifiers and toggled by `(?i)`-style settings inside the body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub caseless: bool,
    pub extended: bool,
    pub no_auto_capture: bool,
    pub dup_names: bool,
}

pub struct Parser {
    chars: Vec<char>,
    pos: usize,
    group_count: usize,
    names: IndexMap<String, usize>,
    options: Options,
    quoting: bool,
    depth: usize,
}

enum ClassAtom {
    Char(char),
    Set { digits: bool },
    Skip,
    End,
}

impl Parser {
    pub fn new(pattern: &str, options: Options) -> Self {
        Parser {
            chars: pattern.chars().collect(),
            pos: 0,
            group_count: 0,
            names: IndexMap::new(),
            options,
            quoting: false,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Node, PatternError> {
        let node = self.parse_alternation()?;
        if self.pos < self.chars.len() {
            return Err(PatternError::UnmatchedParen(self.pos));
        }
        Ok(node)
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn names(&self) -> &IndexMap<String, usize> {
        &self.names
    }

    // ---- Cursor ---- //

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_extended(&mut self) {
        if !self.options.extended || self.quoting {
            return;
        }
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn end_quote(&mut self) {
        if self.quoting && self.peek() == Some('\\') && self.peek_at(1) == Some('E') {
            self.pos += 2;
            self.quoting = false;
        }
    }

    fn literal(&self, ch: char) -> Node {
        Node::Literal { ch, caseless: self.options.caseless && ch.is_alphabetic() }
    }

    fn next_group(&mut self) -> usize {
        self.group_count += 1;
        self.group_count
    }

    // ---- Sequences ---- //

    fn parse_alternation(&mut self) -> Result<Node, PatternError> {
        let mut branches = vec![self.parse_concat()?];
        while self.eat('|') {
            branches.push(self.parse_concat()?);
        }
        Ok(Node::alternation(branches))
    }

    /// In a `(?|...)` group every branch numbers its groups from the same
    /// start; the group count continues after the longest branch.
    fn parse_branch_reset(&mut self) -> Result<Node, PatternError> {
        let start_count = self.group_count;
        let mut max = start_count;
        let mut branches = Vec::new();
        loop {
            self.group_count = start_count;
            branches.push(self.parse_concat()?);
            max = max.max(self.group_count);
            if !self.eat('|') {
                break;
            }
        }
        self.group_count = max;
        Ok(Node::alternation(branches))
    }

    fn parse_concat(&mut self) -> Result<Node, PatternError> {
        let mut nodes = Vec::new();
        loop {
            self.skip_extended();
            match self.peek() {
                None => break,
                Some(')' | '|') if !self.quoting => break,
                _ => nodes.push(self.parse_quantified()?),
            }
        }
        Ok(Node::concat(nodes))
    }

    fn parse_quantified(&mut self) -> Result<Node, PatternError> {
        let mut node = self.parse_atom()?;
        loop {
            if self.quoting {
                return Ok(node);
            }
            self.skip_extended();
            let quant_pos = self.pos;
            let (min, max) = match self.peek() {
                Some('*') => { self.pos += 1; (0, None) }
                Some('+') => { self.pos += 1; (1, None) }
                Some('?') => { self.pos += 1; (0, Some(1)) }
                Some('{') => match self.try_brace_quantifier()? {
                    Some(bounds) => bounds,
                    None => return Ok(node),
                },
                _ => return Ok(node),
            };
            if !node.is_repeatable() {
                return Err(PatternError::NothingToRepeat(quant_pos));
            }
            // lazy or possessive
            if matches!(self.peek(), Some('?' | '+')) {
                self.pos += 1;
            }
            node = Node::Repeat { node: Box::new(node), min, max };
        }
    }

    /// `{n}`, `{n,}`, `{n,m}` or `{,m}`. Anything else leaves the cursor on
    /// the `{`, which is then read as a literal.
    fn try_brace_quantifier(&mut self) -> Result<Option<(u32, Option<u32>)>, PatternError> {
        let start = self.pos;
        self.pos += 1;
        let min = self.read_number();
        let bounds = if self.eat(',') {
            let max = self.read_number();
            match (min, max) {
                (None, None) => None,
                (min, max) => Some((min.unwrap_or(0), max)),
            }
        } else {
            min.map(|n| (n, Some(n)))
        };
        match bounds {
            Some((min, max)) if self.eat('}') => {
                if max.is_some_and(|max| max < min) {
                    return Err(PatternError::QuantifierOutOfOrder(start));
                }
                Ok(Some((min, max)))
            }
            _ => {
                self.pos = start;
                Ok(None)
            }
        }
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits.parse().ok()
    }

    // ---- Atoms ---- //

    fn parse_atom(&mut self) -> Result<Node, PatternError> {
        let pos = self.pos;
        let Some(ch) = self.bump() else {
            return Ok(Node::Empty);
        };
        if self.quoting {
            let node = self.literal(ch);
            self.end_quote();
            return Ok(node);
        }
        match ch {
            '(' => self.parse_group(pos),
            '[' => self.parse_class(pos),
            '\\' => self.parse_escape(pos),
            '.' => Ok(Node::Class(ClassKind::Any)),
            '^' | '$' => Ok(Node::Assertion),
            '*' | '+' | '?' => Err(PatternError::NothingToRepeat(pos)),
            ')' => Err(PatternError::UnmatchedParen(pos)),
            '{' => {
                self.pos = pos;
                if self.try_brace_quantifier()?.is_some() {
                    return Err(PatternError::NothingToRepeat(pos));
                }
                self.pos = pos + 1;
                Ok(self.literal('{'))
            }
            c => Ok(self.literal(c)),
        }
    }

    fn parse_escape(&mut self, pos: usize) -> Result<Node, PatternError> {
        let Some(ch) = self.bump() else {
            return Err(PatternError::TrailingBackslash);
        };
        Ok(match ch {
            'd' => Node::Class(ClassKind::Digit),
            'D' | 'w' | 'W' | 's' | 'S' | 'h' | 'H' | 'v' | 'V' | 'R' | 'N' | 'X' | 'C' => Node::Class(ClassKind::Any),
            'p' | 'P' => {
                self.skip_property(pos)?;
                Node::Class(ClassKind::Any)
            }
            'b' | 'B' | 'A' | 'z' | 'Z' | 'G' | 'K' => Node::Assertion,
            '1'..='9' => {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                Node::Backref
            }
            'g' => self.parse_g_reference(pos)?,
            'k' => {
                let close = match self.bump() {
                    Some('<') => '>',
                    Some('\'') => '\'',
                    Some('{') => '}',
                    _ => return Err(PatternError::UnknownEscape(pos)),
                };
                self.read_name(close)?;
                Node::Backref
            }
            'Q' => {
                self.quoting = true;
                self.end_quote();
                Node::Empty
            }
            'E' => Node::Empty,
            c => {
                let c = self.escaped_char(c, pos)?;
                self.literal(c)
            }
        })
    }

    fn parse_g_reference(&mut self, pos: usize) -> Result<Node, PatternError> {
        match self.peek() {
            Some('{') => {
                self.pos += 1;
                let body_start = self.pos;
                while let Some(c) = self.bump() {
                    if c == '}' {
                        return if self.pos - body_start > 1 {
                            Ok(Node::Backref)
                        } else {
                            Err(PatternError::UnknownEscape(pos))
                        };
                    }
                }
                Err(PatternError::UnknownEscape(pos))
            }
            Some('<' | '\'') => Err(PatternError::Unsupported("subroutine call", pos)),
            Some('+' | '-') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.pos += 1;
                self.read_number();
                Ok(Node::Backref)
            }
            Some(c) if c.is_ascii_digit() => {
                self.read_number();
                Ok(Node::Backref)
            }
            _ => Err(PatternError::UnknownEscape(pos)),
        }
    }

    fn skip_property(&mut self, pos: usize) -> Result<(), PatternError> {
        if self.eat('{') {
            while let Some(c) = self.bump() {
                if c == '}' {
                    return Ok(());
                }
            }
            return Err(PatternError::UnknownEscape(pos));
        }
        self.bump().map(|_| ()).ok_or(PatternError::UnknownEscape(pos))
    }

    /// The character denoted by `\c` for a non-class-shorthand `c`.
    fn escaped_char(&mut self, c: char, pos: usize) -> Result<char, PatternError> {
        let code = match c {
            'a' => 0x07,
            'e' => 0x1b,
            'f' => 0x0c,
            'n' => 0x0a,
            'r' => 0x0d,
            't' => 0x09,
            '0' => self.read_radix(8, 2),
            'o' => {
                if !self.eat('{') {
                    return Err(PatternError::UnknownEscape(pos));
                }
                let code = self.read_radix(8, 11);
                if !self.eat('}') {
                    return Err(PatternError::UnknownEscape(pos));
                }
                code
            }
            'x' => {
                if self.eat('{') {
                    let code = self.read_radix(16, 8);
                    if !self.eat('}') {
                        return Err(PatternError::UnknownEscape(pos));
                    }
                    code
                } else {
                    self.read_radix(16, 2)
                }
            }
            'c' => {
                let target = self.bump().ok_or(PatternError::TrailingBackslash)?;
                if !target.is_ascii() {
                    return Err(PatternError::UnknownEscape(pos));
                }
                u32::from(target.to_ascii_uppercase()) ^ 0x40
            }
            c if !c.is_ascii_alphanumeric() => return Ok(c),
            _ => return Err(PatternError::UnknownEscape(pos)),
        };
        char::from_u32(code).ok_or(PatternError::UnknownEscape(pos))
    }

    fn read_radix(&mut self, radix: u32, max_digits: usize) -> u32 {
        let mut value: u32 = 0;
        for _ in 0..max_digits {
            let Some(digit) = self.peek().and_then(|c| c.to_digit(radix)) else {
                break;
            };
            value = value.saturating_mul(radix).saturating_add(digit);
            self.pos += 1;
        }
        value
    }

    fn read_name(&mut self, close: char) -> Result<String, PatternError> {
        let start = self.pos;
        let mut name = String::new();
        loop {
            match self.bump() {
                Some(c) if c == close => break,
                Some(c) if c.is_alphanumeric() || c == '_' => name.push(c),
                _ => return Err(PatternError::InvalidGroupName(start)),
            }
        }
        let leading_digit = name.chars().next().is_none_or(|c| c.is_ascii_digit());
        if leading_digit || name.chars().count() > 32 {
            return Err(PatternError::InvalidGroupName(start));
        }
        Ok(name)
    }

    // ---- Character classes ---- //

    fn parse_class(&mut self, start: usize) -> Result<Node, PatternError> {
        let negated = self.eat('^');
        let mut digits_only = true;
        let mut items = 0usize;
        let mut first = true;
        loop {
            let atom = self.class_atom(start, first)?;
            first = false;
            match atom {
                ClassAtom::End => break,
                ClassAtom::Skip => {}
                ClassAtom::Set { digits } => {
                    items += 1;
                    digits_only &= digits;
                }
                ClassAtom::Char(lo) => {
                    items += 1;
                    let is_range = self.peek() == Some('-')
                        && self.peek_at(1).is_some_and(|c| c != ']');
                    if !is_range {
                        digits_only &= lo.is_ascii_digit();
                        continue;
                    }
                    let range_pos = self.pos;
                    self.pos += 1;
                    match self.class_atom(start, false)? {
                        ClassAtom::Char(hi) => {
                            if hi < lo {
                                return Err(PatternError::RangeOutOfOrder(range_pos));
                            }
                            digits_only &= lo.is_ascii_digit() && hi.is_ascii_digit();
                        }
                        // `[a-\d]`: the hyphen is literal
                        _ => digits_only = false,
                    }
                }
            }
        }
        let kind = if !negated && digits_only && items > 0 { ClassKind::Digit } else { ClassKind::Any };
        Ok(Node::Class(kind))
    }

    fn class_atom(&mut self, start: usize, first: bool) -> Result<ClassAtom, PatternError> {
        let Some(ch) = self.bump() else {
            return Err(PatternError::UnclosedClass(start));
        };
        match ch {
            ']' if !first => Ok(ClassAtom::End),
            '[' if self.peek() == Some(':') => Ok(self.posix_class().unwrap_or(ClassAtom::Char('['))),
            '\\' => {
                let pos = self.pos - 1;
                let Some(escaped) = self.bump() else {
                    return Err(PatternError::UnclosedClass(start));
                };
                Ok(match escaped {
                    'd' => ClassAtom::Set { digits: true },
                    'D' | 'w' | 'W' | 's' | 'S' | 'h' | 'H' | 'v' | 'V' => ClassAtom::Set { digits: false },
                    'p' | 'P' => {
                        self.skip_property(pos)?;
                        ClassAtom::Set { digits: false }
                    }
                    'b' => ClassAtom::Char('\u{8}'),
                    'E' => ClassAtom::Skip,
                    'Q' => {
                        let mut quoted = Vec::new();
                        while let Some(c) = self.peek() {
                            if c == '\\' && self.peek_at(1) == Some('E') {
                                self.pos += 2;
                                break;
                            }
                            quoted.push(c);
                            self.pos += 1;
                        }
                        if quoted.is_empty() {
                            ClassAtom::Skip
                        } else {
                            ClassAtom::Set { digits: quoted.iter().all(char::is_ascii_digit) }
                        }
                    }
                    c => ClassAtom::Char(self.escaped_char(c, pos)?),
                })
            }
            c => Ok(ClassAtom::Char(c)),
        }
    }

    /// `[:digit:]` and friends; `None` leaves the cursor untouched.
    fn posix_class(&mut self) -> Option<ClassAtom> {
        let rest: String = self.chars[self.pos..].iter().collect();
        let body = rest.strip_prefix(':')?;
        let end = body.find(":]")?;
        let name = &body[..end];
        if !name.chars().all(|c| c.is_ascii_alphabetic() || c == '^') {
            return None;
        }
        self.pos += name.chars().count() + 3;
        Some(ClassAtom::Set { digits: name == "digit" })
    }

    // ---- Groups ---- //

    fn parse_group(&mut self, start: usize) -> Result<Node, PatternError> {
        if self.eat('*') {
            return self.parse_verb(start);
        }
        let outer = self.options;
        if self.eat('?') {
            return self.parse_special_group(start, outer);
        }
        let kind = if self.options.no_auto_capture {
            GroupKind::NonCapture
        } else {
            GroupKind::Capture { index: self.next_group(), name: None }
        };
        self.group_body(start, kind, outer)
    }

    /// Parses a group's contents through the closing `)`; option settings
    /// made inside end with the group.
    fn group_body(&mut self, start: usize, kind: GroupKind, outer: Options) -> Result<Node, PatternError> {
        if self.depth >= NEST_LIMIT {
            return Err(PatternError::NestingTooDeep(start));
        }
        self.depth += 1;
        let node = if matches!(kind, GroupKind::BranchReset) {
            self.parse_branch_reset()
        } else {
            self.parse_alternation()
        };
        self.depth -= 1;
        let node = node?;
        if !self.eat(')') {
            return Err(PatternError::UnclosedGroup(start));
        }
        self.options = outer;
        Ok(Node::Group { kind, node: Box::new(node) })
    }

    fn parse_special_group(&mut self, start: usize, outer: Options) -> Result<Node, PatternError> {
        let pos = self.pos;
        match self.bump() {
            Some(':') => self.group_body(start, GroupKind::NonCapture, outer),
            Some('|') => self.group_body(start, GroupKind::BranchReset, outer),
            Some('>') => self.group_body(start, GroupKind::Atomic, outer),
            Some('=') => self.group_body(start, GroupKind::Look { negative: false }, outer),
            Some('!') => self.group_body(start, GroupKind::Look { negative: true }, outer),
            Some('<') => {
                if self.eat('=') {
                    self.group_body(start, GroupKind::Look { negative: false }, outer)
                } else if self.eat('!') {
                    self.group_body(start, GroupKind::Look { negative: true }, outer)
                } else {
                    self.named_group(start, '>', outer)
                }
            }
            Some('\'') => self.named_group(start, '\'', outer),
            Some('P') => match self.bump() {
                Some('<') => self.named_group(start, '>', outer),
                Some('=') => {
                    self.read_name(')')?;
                    Ok(Node::Backref)
                }
                Some('>') => Err(PatternError::Unsupported("subroutine call", start)),
                _ => Err(PatternError::UnknownGroupSyntax(pos)),
            },
            Some('#') => {
                while let Some(c) = self.bump() {
                    if c == ')' {
                        return Ok(Node::Empty);
                    }
                }
                Err(PatternError::UnclosedGroup(start))
            }
            Some('(') => Err(PatternError::Unsupported("conditional group", start)),
            Some('R' | '&') => Err(PatternError::Unsupported("recursion", start)),
            Some(c) if c.is_ascii_digit() || ((c == '+' || c == '-') && self.peek().is_some_and(|d| d.is_ascii_digit())) => {
                Err(PatternError::Unsupported("recursion", start))
            }
            Some('C') => Err(PatternError::Unsupported("callout", start)),
            Some(_) => {
                self.pos = pos;
                self.parse_option_setting(start, outer)
            }
            None => Err(PatternError::UnclosedGroup(start)),
        }
    }

    fn named_group(&mut self, start: usize, close: char, outer: Options) -> Result<Node, PatternError> {
        let name = self.read_name(close)?;
        let index = self.next_group();
        match self.names.get(&name) {
            Some(&existing) if existing != index && !self.options.dup_names => {
                return Err(PatternError::DuplicateGroupName(name));
            }
            Some(_) => {}
            None => {
                self.names.insert(name.clone(), index);
            }
        }
        self.group_body(start, GroupKind::Capture { index, name: Some(name) }, outer)
    }

    /// `(?i)`, `(?-x)`, `(?^)` or the scoped `(?i-x:...)`.
    fn parse_option_setting(&mut self, start: usize, outer: Options) -> Result<Node, PatternError> {
        let first = self.pos;
        let mut options = self.options;
        let mut on = true;
        loop {
            let pos = self.pos;
            match self.bump() {
                Some('^') if pos == first => {
                    options.caseless = false;
                    options.extended = false;
                    options.no_auto_capture = false;
                }
                Some('-') if on => on = false,
                Some('i') => options.caseless = on,
                Some('x') => options.extended = on,
                Some('n') => options.no_auto_capture = on,
                Some('J') => options.dup_names = on,
                Some('m' | 's' | 'U') => {}
                Some(')') => {
                    self.options = options;
                    return Ok(Node::Empty);
                }
                Some(':') => {
                    self.options = options;
                    return self.group_body(start, GroupKind::NonCapture, outer);
                }
                Some(_) => return Err(PatternError::UnknownGroupSyntax(pos)),
                None => return Err(PatternError::UnclosedGroup(start)),
            }
        }
    }

    fn parse_verb(&mut self, start: usize) -> Result<Node, PatternError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '=' {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        let arg = if self.eat(':') {
            let mut arg = String::new();
            loop {
                match self.bump() {
                    Some(')') => break,
                    Some(c) => arg.push(c),
                    None => return Err(PatternError::UnclosedGroup(start)),
                }
            }
            Some(arg)
        } else if self.eat(')') {
            None
        } else {
            return Err(PatternError::UnknownVerb(start));
        };
        match (name.as_str(), arg) {
            ("" | "MARK" | "PRUNE" | "THEN" | "ACCEPT" | "FAIL" | "F" | "COMMIT", Some(mark)) if !mark.is_empty() => {
                Ok(Node::Verb(Verb::Mark(mark)))
            }
            ("" | "MARK", _) => Err(PatternError::MarkWithoutName(start)),
            ("PRUNE" | "THEN" | "ACCEPT" | "FAIL" | "F" | "COMMIT" | "SKIP", _) => Ok(Node::Verb(Verb::Control)),
            (other, None) if is_start_option(other) => Ok(Node::Verb(Verb::Control)),
            _ => Err(PatternError::UnknownVerb(start)),
        }
    }
}

fn is_start_option(name: &str) -> bool {
    const OPTIONS: &[&str] = &[
        "UTF", "UTF8", "UCP", "CR", "LF", "CRLF", "ANYCRLF", "ANY", "NUL",
        "BSR_ANYCRLF", "BSR_UNICODE", "NO_AUTO_POSSESS", "NO_DOTSTAR_ANCHOR",
        "NO_JIT", "NO_START_OPT", "NOTEMPTY", "NOTEMPTY_ATSTART",
    ];
    const LIMITS: &[&str] = &["LIMIT_MATCH=", "LIMIT_RECURSION=", "LIMIT_DEPTH=", "LIMIT_HEAP="];
    OPTIONS.contains(&name)
        || LIMITS.iter().any(|prefix| {
            name.strip_prefix(prefix).is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Result<(Node, usize), PatternError> {
        let mut parser = Parser::new(src, Options::default());
        let node = parser.parse()?;
        Ok((node, parser.group_count()))
    }

    fn groups(src: &str) -> usize {
        parse(src).unwrap().1
    }

    #[test]
    fn counts_capturing_groups() {
        assert_eq!(groups("abc"), 0);
        assert_eq!(groups("(a)(?:b)(c(d))"), 3);
        assert_eq!(groups("(?<y>\\d+)-(?P<m>\\d+)-(?'d'\\d+)"), 3);
        assert_eq!(groups("(?=(a))(?<=b)(?<!c)(?!d)"), 1);
        assert_eq!(groups("\\(a\\)[(b)]"), 0);
    }

    #[test]
    fn branch_reset_shares_numbers() {
        assert_eq!(groups("(?|(a)|(b)(c))(d)"), 4);
        let mut parser = Parser::new("(?|(?<n>a)|(?<n>b))", Options::default());
        parser.parse().unwrap();
        assert_eq!(parser.names().get("n"), Some(&1));
    }

    #[test]
    fn nesting_is_limited() {
        let nested = |depth: usize| format!("{}a{}", "(?:".repeat(depth), ")".repeat(depth));
        assert!(parse(&nested(NEST_LIMIT)).is_ok());
        assert!(matches!(parse(&nested(NEST_LIMIT + 1)), Err(PatternError::NestingTooDeep(_))));
        assert!(matches!(parse(&nested(3000)), Err(PatternError::NestingTooDeep(_))));
    }

    #[test]
    fn simple_tree_shape() {
        let (node, _) = parse("a?|(b)").unwrap();
        let expected = Node::Alternation(vec![
            Node::Repeat {
                node: Box::new(Node::Literal { ch: 'a', caseless: false }),
                min: 0,
                max: Some(1),
            },
            Node::Group {
                kind: GroupKind::Capture { index: 1, name: None },
                node: Box::new(Node::Literal { ch: 'b', caseless: false }),
            },
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn quantifier_forms() {
        let (node, _) = parse("a{2,3}?").unwrap();
        assert!(matches!(node, Node::Repeat { min: 2, max: Some(3), .. }));
        let (node, _) = parse("a{,3}").unwrap();
        assert!(matches!(node, Node::Repeat { min: 0, max: Some(3), .. }));
        // not a quantifier, so literal braces
        let (node, _) = parse("a{x}").unwrap();
        assert!(matches!(node, Node::Concat(ref xs) if xs.len() == 4));
        assert_eq!(parse("a{3,2}").unwrap_err(), PatternError::QuantifierOutOfOrder(1));
        assert_eq!(parse("*a").unwrap_err(), PatternError::NothingToRepeat(0));
        assert_eq!(parse("a**").unwrap_err(), PatternError::NothingToRepeat(2));
        assert_eq!(parse("(|*)").unwrap_err(), PatternError::NothingToRepeat(2));
        assert!(parse("a++b*+").is_ok());
    }

    #[test]
    fn structural_errors() {
        assert_eq!(parse("(a").unwrap_err(), PatternError::UnclosedGroup(0));
        assert_eq!(parse("a)").unwrap_err(), PatternError::UnmatchedParen(1));
        assert_eq!(parse("x[ab").unwrap_err(), PatternError::UnclosedClass(1));
        assert_eq!(parse("[z-a]").unwrap_err(), PatternError::RangeOutOfOrder(2));
        assert_eq!(parse("a\\").unwrap_err(), PatternError::TrailingBackslash);
        assert_eq!(parse("\\i").unwrap_err(), PatternError::UnknownEscape(0));
        assert_eq!(parse("(?<1a>x)").unwrap_err(), PatternError::InvalidGroupName(3));
        assert_eq!(parse("(?<n>a)(?<n>b)").unwrap_err(), PatternError::DuplicateGroupName("n".into()));
        assert_eq!(parse("(?(1)a|b)").unwrap_err(), PatternError::Unsupported("conditional group", 0));
        assert_eq!(parse("(?R)").unwrap_err(), PatternError::Unsupported("recursion", 0));
        assert_eq!(parse("(?Q)").unwrap_err(), PatternError::UnknownGroupSyntax(2));
    }

    #[test]
    fn duplicate_names_with_j_option() {
        let mut parser = Parser::new("(?J)(?<n>a)|(?<n>b)", Options::default());
        parser.parse().unwrap();
        assert_eq!(parser.group_count(), 2);
    }

    #[test]
    fn classes() {
        assert_eq!(parse("[0-9]").unwrap().0, Node::Class(ClassKind::Digit));
        assert_eq!(parse("[\\d]").unwrap().0, Node::Class(ClassKind::Digit));
        assert_eq!(parse("[[:digit:]]").unwrap().0, Node::Class(ClassKind::Digit));
        assert_eq!(parse("[^0-9]").unwrap().0, Node::Class(ClassKind::Any));
        assert_eq!(parse("[0-9a]").unwrap().0, Node::Class(ClassKind::Any));
        assert_eq!(parse("[]a]").unwrap().0, Node::Class(ClassKind::Any));
        assert_eq!(parse("[0-]").unwrap().0, Node::Class(ClassKind::Any));
    }

    #[test]
    fn verbs() {
        let (node, _) = parse("(*MARK:A)a|(*:B)b").unwrap();
        let Node::Alternation(branches) = node else { panic!("expected alternation") };
        assert_eq!(
            branches[0],
            Node::Concat(vec![Node::Verb(Verb::Mark("A".into())), Node::Literal { ch: 'a', caseless: false }])
        );
        assert!(parse("(*UTF8)(*LIMIT_MATCH=10)a(*SKIP)(*FAIL)").is_ok());
        assert_eq!(parse("(*MARK)").unwrap_err(), PatternError::MarkWithoutName(0));
        assert_eq!(parse("(*BOGUS)").unwrap_err(), PatternError::UnknownVerb(0));
    }

    #[test]
    fn quoting_and_escapes() {
        assert_eq!(groups("\\Q(a)|\\E(b)"), 1);
        assert_eq!(
            parse("\\x41\\t").unwrap().0,
            Node::Concat(vec![
                Node::Literal { ch: 'A', caseless: false },
                Node::Literal { ch: '\t', caseless: false },
            ])
        );
        assert_eq!(parse("(a)\\1\\g{-1}\\k<n>").map(|(_, n)| n), Ok(1));
    }

    #[test]
    fn inline_options_are_scoped_to_their_group() {
        let (node, _) = parse("(?:(?i)a)a").unwrap();
        let Node::Concat(items) = node else { panic!("expected concat") };
        let Node::Group { node: inner, .. } = &items[0] else { panic!("expected group") };
        assert_eq!(**inner, Node::Literal { ch: 'a', caseless: true });
        assert_eq!(items[1], Node::Literal { ch: 'a', caseless: false });

        let mut parser = Parser::new("(?x) ( a ) # trailing (b)\n", Options::default());
        parser.parse().unwrap();
        assert_eq!(parser.group_count(), 1);

        let mut parser = Parser::new("(a)(?<n>b)", Options { no_auto_capture: true, ..Options::default() });
        parser.parse().unwrap();
        assert_eq!(parser.group_count(), 1);
    }
}
