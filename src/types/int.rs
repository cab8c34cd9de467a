use std::fmt;

/// Closed integer interval; `None` bounds are open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IntRange {
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self { Self { min, max } }
    pub fn any() -> Self { Self::default() }

    pub fn contains(&self, value: i64) -> bool {
        self.min.is_none_or(|m| value >= m) && self.max.is_none_or(|m| value <= m)
    }

    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return None;
            }
        }
        Some(Self { min, max })
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (None, None) => f.write_str("int"),
            (min, max) => {
                let min = min.map_or_else(|| "min".to_string(), |v| v.to_string());
                let max = max.map_or_else(|| "max".to_string(), |v| v.to_string());
                write!(f, "int<{min}, {max}>")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ended_ranges() {
        let offset = IntRange::new(Some(-1), None);
        assert_eq!(offset.to_string(), "int<-1, max>");
        assert!(offset.contains(-1));
        assert!(!offset.contains(-2));
        assert_eq!(IntRange::any().to_string(), "int");
    }

    #[test]
    fn intersection_narrows_or_empties() {
        let a = IntRange::new(Some(-1), None);
        let b = IntRange::new(None, Some(5));
        assert_eq!(a.intersect(&b), Some(IntRange::new(Some(-1), Some(5))));
        assert_eq!(IntRange::new(Some(3), Some(4)).intersect(&IntRange::new(Some(5), None)), None);
    }
}
