//! Closed type algebra for match results.
//!
//! Only what a regex match can produce is modelled: strings (with a small
//! refinement lattice), `null`, integer ranges, array shapes and lists.
//!
//! Design goals:
//! - Every operation is an exhaustive match over [`Type`]; no dispatch tables.
//! - `union` is associative/commutative/idempotent up to member order.
//! - Subtype absorption is derived from `intersect`: `a <: b` iff `a ∩ b == a`.
pub mod str;
pub mod int;
pub mod shape;

use std::fmt;
use serde::{Serialize, Serializer};

pub use str::StrKind;
pub use int::IntRange;
pub use shape::{ArrayShape, Key, ShapeBuilder, ShapeEntry};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Never,
    Mixed,
    Null,
    String(StrKind),
    ConstantString(String),
    Int(IntRange),
    ConstantInt(i64),
    Shape(ArrayShape),
    List(Box<Type>),
    Union(Vec<Type>),
}

// ------------------------------ Constructors ------------------------------ //

impl Type {
    pub fn string() -> Self { Type::String(StrKind::Any) }
    pub fn non_empty_string() -> Self { Type::String(StrKind::NonEmpty) }
    pub fn numeric_string() -> Self { Type::String(StrKind::Numeric) }
    pub fn constant_string(s: impl Into<String>) -> Self { Type::ConstantString(s.into()) }
    pub fn int_range(min: Option<i64>, max: Option<i64>) -> Self { Type::Int(IntRange::new(min, max)) }
    pub fn list_of(item: Type) -> Self { Type::List(Box::new(item)) }

    pub fn is_null(&self) -> bool { matches!(self, Type::Null) }

    pub fn members(&self) -> &[Type] {
        match self {
            Type::Union(xs) => xs,
            other => std::slice::from_ref(other),
        }
    }

    /// The constant strings this type consists of, or nothing when any
    /// member is not a constant string.
    pub fn constant_strings(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for member in self.members() {
            match member {
                Type::ConstantString(s) => out.push(s.as_str()),
                _ => return Vec::new(),
            }
        }
        out
    }

    pub fn constant_ints(&self) -> Vec<i64> {
        let mut out = Vec::new();
        for member in self.members() {
            match member {
                Type::ConstantInt(v) => out.push(*v),
                _ => return Vec::new(),
            }
        }
        out
    }

    pub fn constant_int(&self) -> Option<i64> {
        match self {
            Type::ConstantInt(v) => Some(*v),
            _ => None,
        }
    }
}

// -------------------------------- Union (⊔) ------------------------------- //

impl Type {
    pub fn union<I>(types: I) -> Type
    where
        I: IntoIterator<Item = Type>,
    {
        let mut members = Vec::new();
        for ty in types {
            push_member(&mut members, ty);
        }

        // '' ∪ non-empty-string is exactly string
        let has_empty = members.iter().any(|m| matches!(m, Type::ConstantString(s) if s.is_empty()));
        let has_non_empty = members.contains(&Type::non_empty_string());
        if has_empty && has_non_empty {
            let widened: Vec<Type> = members.into_iter()
                .filter(|m| !matches!(m, Type::ConstantString(s) if s.is_empty()))
                .map(|m| if m == Type::non_empty_string() { Type::string() } else { m })
                .collect();
            members = Vec::new();
            for ty in widened {
                push_member(&mut members, ty);
            }
        }

        members.sort_by_key(Type::is_null);
        match members.len() {
            0 => Type::Never,
            1 => members.swap_remove(0),
            _ => Type::Union(members),
        }
    }

    pub fn add_null(self) -> Type {
        Type::union([self, Type::Null])
    }

    /// Removes a top-level `null` member only.
    pub fn remove_null(self) -> Type {
        match self {
            Type::Null => Type::Never,
            Type::Union(xs) => Type::union(xs.into_iter().filter(|x| !x.is_null())),
            other => other,
        }
    }
}

fn push_member(members: &mut Vec<Type>, ty: Type) {
    match ty {
        Type::Never => {}
        Type::Union(xs) => {
            for x in xs {
                push_member(members, x);
            }
        }
        ty => {
            if members.iter().any(|m| ty.is_subtype_of(m)) {
                return;
            }
            members.retain(|m| !m.is_subtype_of(&ty));
            members.push(ty);
        }
    }
}

// ----------------------------- Intersect (⊓) ------------------------------ //

impl Type {
    pub fn intersect(&self, other: &Type) -> Type {
        use Type::*;
        match (self, other) {
            (Never, _) | (_, Never) => Never,
            (Mixed, t) | (t, Mixed) => t.clone(),
            (Union(xs), _) => Type::union(xs.iter().map(|x| x.intersect(other))),
            (_, Union(ys)) => Type::union(ys.iter().map(|y| self.intersect(y))),
            (Null, Null) => Null,
            (String(a), String(b)) => String(a.meet(*b)),
            (ConstantString(s), String(k)) | (String(k), ConstantString(s)) => {
                if k.accepts(s) { ConstantString(s.clone()) } else { Never }
            }
            (ConstantString(a), ConstantString(b)) if a == b => ConstantString(a.clone()),
            (Int(a), Int(b)) => a.intersect(b).map_or(Never, Int),
            (ConstantInt(v), Int(r)) | (Int(r), ConstantInt(v)) => {
                if r.contains(*v) { ConstantInt(*v) } else { Never }
            }
            (ConstantInt(a), ConstantInt(b)) if a == b => ConstantInt(*a),
            (Shape(a), Shape(b)) => a.intersect(b).map_or(Never, Shape),
            (List(a), List(b)) => Type::list_of(a.intersect(b)),
            _ => Never,
        }
    }

    pub fn is_subtype_of(&self, other: &Type) -> bool {
        self.intersect(other) == *self
    }
}

// ------------------------------- Emission --------------------------------- //

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Never => f.write_str("never"),
            Type::Mixed => f.write_str("mixed"),
            Type::Null => f.write_str("null"),
            Type::String(kind) => write!(f, "{kind}"),
            Type::ConstantString(s) => f.write_str(&str::quote_literal(s)),
            Type::Int(range) => write!(f, "{range}"),
            Type::ConstantInt(v) => write!(f, "{v}"),
            Type::Shape(shape) => write!(f, "{shape}"),
            Type::List(item) => write!(f, "list<{item}>"),
            Type::Union(xs) => {
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{x}")?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lit(s: &str) -> Type { Type::constant_string(s) }

    #[test]
    fn union_absorbs_subtypes() {
        assert_eq!(Type::union([lit("a"), Type::string()]), Type::string());
        assert_eq!(Type::union([Type::numeric_string(), Type::non_empty_string()]), Type::non_empty_string());
        assert_eq!(Type::union([lit("12"), Type::numeric_string()]), Type::numeric_string());
        assert_eq!(Type::union([lit("a"), lit("a")]), lit("a"));
    }

    #[test]
    fn empty_string_widens_non_empty_string() {
        assert_eq!(Type::union([Type::non_empty_string(), lit("")]), Type::string());
        assert_eq!(Type::union([Type::numeric_string(), lit("")]).to_string(), "numeric-string|''");
    }

    #[test]
    fn null_is_printed_last_and_unions_flatten() {
        let t = Type::union([Type::Null, Type::union([lit("a"), lit("b")])]);
        assert_eq!(t.to_string(), "'a'|'b'|null");
        assert_eq!(Type::union(Vec::new()), Type::Never);
    }

    #[test]
    fn null_add_and_remove() {
        assert_eq!(Type::string().add_null().to_string(), "string|null");
        assert_eq!(Type::string().add_null().remove_null(), Type::string());
        assert_eq!(Type::Null.remove_null(), Type::Never);
        // nested nulls survive, only the top level is touched
        let mut pair = ShapeBuilder::new();
        pair.set_offset_value_type(0i64, Type::string().add_null(), false);
        let pair = pair.build();
        assert_eq!(pair.clone().remove_null(), pair);
    }

    #[test]
    fn intersections() {
        assert_eq!(Type::string().intersect(&Type::non_empty_string()), Type::non_empty_string());
        assert_eq!(lit("a").intersect(&Type::numeric_string()), Type::Never);
        assert_eq!(lit("12").intersect(&Type::numeric_string()), lit("12"));
        assert_eq!(
            Type::int_range(Some(-1), None).intersect(&Type::int_range(None, Some(5))).to_string(),
            "int<-1, 5>"
        );
        assert_eq!(Type::ConstantInt(3).intersect(&Type::int_range(Some(-1), None)), Type::ConstantInt(3));
        assert_eq!(Type::union([lit("a"), Type::Null]).intersect(&Type::string()), lit("a"));
        assert_eq!(Type::Mixed.intersect(&Type::Null), Type::Null);
    }

    #[test]
    fn shapes_with_different_keys_stay_apart() {
        let mut a = ShapeBuilder::new();
        a.set_offset_value_type(0i64, Type::string(), false);
        let mut b = ShapeBuilder::new();
        b.set_offset_value_type(0i64, Type::string(), false);
        b.set_offset_value_type(1i64, lit("a"), false);
        let u = Type::union([a.build(), b.build()]);
        assert_eq!(u.to_string(), "array{string}|array{string, 'a'}");
    }

    #[test]
    fn narrower_shape_is_absorbed() {
        let mut a = ShapeBuilder::new();
        a.set_offset_value_type(0i64, lit("x"), false);
        let mut b = ShapeBuilder::new();
        b.set_offset_value_type(0i64, Type::string(), false);
        assert_eq!(Type::union([a.build(), b.build()]).to_string(), "array{string}");
    }

    #[test]
    fn lists_and_constants() {
        assert_eq!(Type::list_of(Type::string()).to_string(), "list<string>");
        let t = Type::union([lit("/a/"), lit("/b/")]);
        assert_eq!(t.constant_strings(), vec!["/a/", "/b/"]);
        assert!(Type::union([lit("/a/"), Type::string()]).constant_strings().is_empty());
        assert_eq!(Type::ConstantInt(2).constant_int(), Some(2));
    }
}
