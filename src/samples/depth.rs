//! Total-ordered depth key for record collections.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Position of a sample within its core.
///
/// A thin wrapper over `f64` with a *total* order (`total_cmp`) and
/// bit-pattern equality/hashing, so depths can key a `BTreeMap` and take
/// part in work-item identity.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Depth(f64);

impl Depth {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Depth {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<i64> for Depth {
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl PartialEq for Depth {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Depth {}

impl PartialOrd for Depth {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Depth {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for Depth {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
