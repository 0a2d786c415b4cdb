//! Hashable score keys.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A score usable as a hash and ordered map key.
///
/// Equality is exact: two scores match only if they are the same `f64`.
/// `-0.0` is folded into `0.0` so both spellings land in one bucket.
#[derive(Debug, Clone, Copy)]
pub struct Score(f64);

impl Score {
    /// Wraps a score value.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    /// Returns the wrapped value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Score {}

impl Hash for Score {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn negative_zero_folds() {
        assert_eq!(Score::new(-0.0), Score::new(0.0));
        let set: HashSet<Score> = [Score::new(-0.0), Score::new(0.0)].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn exact_equality() {
        assert_eq!(Score::new(3.25), Score::from(3.25));
        assert_ne!(Score::new(0.1 + 0.2), Score::new(0.3));
    }

    #[test]
    fn ordering() {
        assert!(Score::new(1.0) < Score::new(2.0));
        assert!(Score::new(-1.0) < Score::new(0.0));
    }
}
