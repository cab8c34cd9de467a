use serde::{Deserialize, Serialize};

/// Three-valued certainty: definitely, possibly, or definitely not.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Trinary {
    Yes,
    #[default]
    Maybe,
    No,
}

impl Trinary {
    pub fn from_bool(value: bool) -> Self {
        if value { Trinary::Yes } else { Trinary::No }
    }

    pub fn yes(self) -> bool { self == Trinary::Yes }
    pub fn no(self) -> bool { self == Trinary::No }

    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Trinary::No, _) | (_, Trinary::No) => Trinary::No,
            (Trinary::Yes, Trinary::Yes) => Trinary::Yes,
            _ => Trinary::Maybe,
        }
    }

    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Trinary::Yes, _) | (_, Trinary::Yes) => Trinary::Yes,
            (Trinary::No, Trinary::No) => Trinary::No,
            _ => Trinary::Maybe,
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Trinary::Yes => Trinary::No,
            Trinary::Maybe => Trinary::Maybe,
            Trinary::No => Trinary::Yes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kleene_logic() {
        assert_eq!(Trinary::Yes.and(Trinary::Maybe), Trinary::Maybe);
        assert_eq!(Trinary::Maybe.and(Trinary::No), Trinary::No);
        assert_eq!(Trinary::No.or(Trinary::Maybe), Trinary::Maybe);
        assert_eq!(Trinary::Maybe.or(Trinary::Yes), Trinary::Yes);
        assert_eq!(Trinary::Maybe.negate(), Trinary::Maybe);
        assert_eq!(Trinary::from_bool(false).negate(), Trinary::Yes);
    }

    #[test]
    fn deserializes_lowercase() {
        let t: Trinary = serde_json::from_str("\"no\"").unwrap();
        assert!(t.no());
    }
}
