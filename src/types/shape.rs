use std::fmt;
use indexmap::IndexMap;
use super::Type;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl From<i64> for Key {
    fn from(value: i64) -> Self { Key::Int(value) }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self { Key::Str(value.to_string()) }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) if is_identifier(s) => f.write_str(s),
            Key::Str(s) => f.write_str(&super::str::quote_literal(s)),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeEntry {
    pub key: Key,
    pub value: Type,
    pub optional: bool,
}

/// Ordered `array{...}` shape. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayShape {
    entries: Vec<ShapeEntry>,
}

impl ArrayShape {
    pub fn empty() -> Self { Self::default() }
    pub fn entries(&self) -> &[ShapeEntry] { &self.entries }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, key: &Key) -> Option<&ShapeEntry> {
        self.entries.iter().find(|e| &e.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|e| &e.key)
    }

    fn is_list_like(&self) -> bool {
        self.entries.iter().enumerate().all(|(i, e)| {
            !e.optional && e.key == Key::Int(i as i64)
        })
    }

    /// Entry-wise intersection; shapes with different key sets or
    /// optionality do not overlap in this model.
    pub(super) fn intersect(&self, other: &Self) -> Option<Self> {
        if self.entries.len() != other.entries.len() {
            return None;
        }
        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let theirs = other.get(&entry.key)?;
            if theirs.optional != entry.optional {
                return None;
            }
            let value = entry.value.intersect(&theirs.value);
            if value == Type::Never && !entry.optional {
                return None;
            }
            entries.push(ShapeEntry { key: entry.key.clone(), value, optional: entry.optional });
        }
        Some(Self { entries })
    }
}

impl fmt::Display for ArrayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("array{")?;
        let list_like = self.is_list_like();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if list_like {
                write!(f, "{}", entry.value)?;
            } else {
                let mark = if entry.optional { "?" } else { "" };
                write!(f, "{}{mark}: {}", entry.key, entry.value)?;
            }
        }
        f.write_str("}")
    }
}

/// Append-only builder for [`ArrayShape`].
#[derive(Debug, Default)]
pub struct ShapeBuilder {
    entries: IndexMap<Key, (Type, bool)>,
}

impl ShapeBuilder {
    pub fn new() -> Self { Self::default() }

    /// Setting an existing key replaces its value; an optional write
    /// keeps the previous value as an alternative.
    pub fn set_offset_value_type(&mut self, key: impl Into<Key>, value: Type, optional: bool) {
        let key = key.into();
        match self.entries.get_mut(&key) {
            Some((existing, was_optional)) => {
                *existing = if optional {
                    Type::union([value, existing.clone()])
                } else {
                    value
                };
                if !optional {
                    *was_optional = false;
                }
            }
            None => {
                self.entries.insert(key, (value, optional));
            }
        }
    }

    pub fn shape(self) -> ArrayShape {
        ArrayShape {
            entries: self.entries.into_iter()
                .map(|(key, (value, optional))| ShapeEntry { key, value, optional })
                .collect(),
        }
    }

    pub fn build(self) -> Type {
        Type::Shape(self.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn list_like_shapes_omit_keys() {
        let mut b = ShapeBuilder::new();
        b.set_offset_value_type(0i64, Type::string(), false);
        b.set_offset_value_type(1i64, Type::constant_string("a"), false);
        assert_eq!(b.build().to_string(), "array{string, 'a'}");
    }

    #[test]
    fn optional_and_named_keys_are_printed() {
        let mut b = ShapeBuilder::new();
        b.set_offset_value_type(0i64, Type::string(), false);
        b.set_offset_value_type("year", Type::numeric_string(), true);
        b.set_offset_value_type("my key", Type::Null, false);
        assert_eq!(b.build().to_string(), "array{0: string, year?: numeric-string, 'my key': null}");
    }

    #[test]
    fn rewriting_a_key_follows_optionality() {
        let mut b = ShapeBuilder::new();
        b.set_offset_value_type("n", Type::constant_string("a"), true);
        b.set_offset_value_type("n", Type::constant_string("b"), true);
        b.set_offset_value_type("m", Type::constant_string("a"), true);
        b.set_offset_value_type("m", Type::constant_string("b"), false);
        let shape = b.shape();
        let n = shape.get(&Key::from("n")).unwrap();
        assert_eq!(n.value.to_string(), "'b'|'a'");
        assert!(n.optional);
        let m = shape.get(&Key::from("m")).unwrap();
        assert_eq!(m.value.to_string(), "'b'");
        assert!(!m.optional);
    }

    #[test]
    fn empty_shape() {
        assert_eq!(ArrayShape::empty().to_string(), "array{}");
    }
}
