//! Pattern and flag expressions, and the scope that types them.
//!
//! Only the handful of expression forms that reach a `preg_*` call site in
//! practice are modelled; anything else types as `mixed`, which the matcher
//! treats as "not statically known".
use indexmap::IndexMap;
use crate::flags::preg_constant;
use crate::types::{IntRange, StrKind, Type};

/// Maximum number of constant strings a concatenation may expand to
/// before it is widened to `string`.
pub const CONCAT_LIMIT: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    String(String),
    Int(i64),
    Null,
    Var(String),
    Const(String),
    Concat(Box<Expr>, Box<Expr>),
    BitOr(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn string(s: impl Into<String>) -> Self { Expr::String(s.into()) }
    pub fn var(name: impl Into<String>) -> Self { Expr::Var(name.into()) }
    pub fn concat(lhs: Expr, rhs: Expr) -> Self { Expr::Concat(Box::new(lhs), Box::new(rhs)) }
    pub fn bit_or(lhs: Expr, rhs: Expr) -> Self { Expr::BitOr(Box::new(lhs), Box::new(rhs)) }

    /// Parse a flags argument written the PHP way:
    /// `PREG_SET_ORDER | PREG_OFFSET_CAPTURE`, `256`, `0x100`, `$flags`.
    pub fn parse_flags(src: &str) -> Option<Expr> {
        let mut operands = src.split('|').map(str::trim).map(|term| {
            if term.is_empty() {
                return None;
            }
            if let Some(name) = term.strip_prefix('$') {
                return Some(Expr::var(name));
            }
            if term.eq_ignore_ascii_case("null") {
                return Some(Expr::Null);
            }
            if let Some(hex) = term.strip_prefix("0x").or_else(|| term.strip_prefix("0X")) {
                return i64::from_str_radix(hex, 16).ok().map(Expr::Int);
            }
            if let Ok(v) = term.parse::<i64>() {
                return Some(Expr::Int(v));
            }
            let is_ident = term.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && term.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            is_ident.then(|| Expr::Const(term.to_string()))
        });
        let first = operands.next()??;
        operands.try_fold(first, |acc, next| Some(Expr::bit_or(acc, next?)))
    }
}

/// Source of static types for expressions.
pub trait Scope {
    fn type_of(&self, expr: &Expr) -> Type;
}

/// A scope backed by a plain variable table.
#[derive(Clone, Debug, Default)]
pub struct MapScope {
    vars: IndexMap<String, Type>,
}

impl MapScope {
    pub fn new() -> Self { Self::default() }

    pub fn with_var(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.vars.insert(name.into(), ty);
        self
    }
}

impl Scope for MapScope {
    fn type_of(&self, expr: &Expr) -> Type {
        match expr {
            Expr::String(s) => Type::constant_string(s.clone()),
            Expr::Int(v) => Type::ConstantInt(*v),
            Expr::Null => Type::Null,
            Expr::Var(name) => self.vars.get(name).cloned().unwrap_or(Type::Mixed),
            Expr::Const(name) => preg_constant(name).map_or(Type::Mixed, Type::ConstantInt),
            Expr::Concat(lhs, rhs) => concat_types(&self.type_of(lhs), &self.type_of(rhs)),
            Expr::BitOr(lhs, rhs) => bit_or_types(&self.type_of(lhs), &self.type_of(rhs)),
        }
    }
}

fn concat_types(lhs: &Type, rhs: &Type) -> Type {
    let (left, right) = (lhs.constant_strings(), rhs.constant_strings());
    if left.is_empty() || right.is_empty() || left.len() * right.len() > CONCAT_LIMIT {
        return widen_concat(lhs, rhs);
    }
    Type::union(left.iter().flat_map(|l| {
        right.iter().map(move |r| Type::constant_string(format!("{l}{r}")))
    }))
}

fn widen_concat(lhs: &Type, rhs: &Type) -> Type {
    let non_empty = |t: &Type| t.members().iter().all(|m| match m {
        Type::ConstantString(s) => !s.is_empty(),
        Type::String(kind) => *kind <= StrKind::NonEmpty,
        _ => false,
    });
    if non_empty(lhs) || non_empty(rhs) {
        Type::non_empty_string()
    } else {
        Type::string()
    }
}

fn bit_or_types(lhs: &Type, rhs: &Type) -> Type {
    let (left, right) = (lhs.constant_ints(), rhs.constant_ints());
    if left.is_empty() || right.is_empty() || left.len() * right.len() > CONCAT_LIMIT {
        return Type::Int(IntRange::any());
    }
    Type::union(left.iter().flat_map(|l| right.iter().map(move |r| Type::ConstantInt(l | r))))
}

/// The static type of a pattern argument.
pub fn resolve_pattern_type(expr: &Expr, scope: &dyn Scope) -> Type {
    scope.type_of(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn concatenation_of_constants_is_a_product() {
        let scope = MapScope::new().with_var(
            "sep",
            Type::union([Type::constant_string(","), Type::constant_string(";")]),
        );
        let expr = Expr::concat(Expr::string("/(a)"), Expr::concat(Expr::var("sep"), Expr::string("/")));
        assert_eq!(resolve_pattern_type(&expr, &scope).to_string(), "'/(a),/'|'/(a);/'");
    }

    #[test]
    fn dynamic_parts_widen_to_string() {
        let scope = MapScope::new().with_var("x", Type::string());
        let expr = Expr::concat(Expr::string("/a"), Expr::var("x"));
        assert_eq!(resolve_pattern_type(&expr, &scope), Type::non_empty_string());
        assert_eq!(resolve_pattern_type(&Expr::var("unknown"), &scope), Type::Mixed);
    }

    #[test]
    fn oversized_products_widen() {
        let many = Type::union((0..5).map(|i| Type::constant_string(format!("{i}"))));
        let scope = MapScope::new().with_var("d", many);
        let expr = Expr::concat(Expr::var("d"), Expr::var("d"));
        assert_eq!(resolve_pattern_type(&expr, &scope), Type::non_empty_string());
    }

    #[test]
    fn flags_expressions() {
        let scope = MapScope::new();
        let expr = Expr::parse_flags("PREG_SET_ORDER | PREG_OFFSET_CAPTURE").unwrap();
        assert_eq!(scope.type_of(&expr), Type::ConstantInt(258));
        assert_eq!(scope.type_of(&Expr::parse_flags("0x200").unwrap()), Type::ConstantInt(512));
        assert_eq!(scope.type_of(&Expr::parse_flags("PREG_NOPE").unwrap()), Type::Mixed);
        assert_eq!(Expr::parse_flags("1 |"), None);
        assert_eq!(Expr::parse_flags("$f"), Some(Expr::var("f")));
    }
}
