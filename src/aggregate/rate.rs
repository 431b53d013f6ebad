//! Ratios reported as percentages

use std::fmt;

use serde::{Serialize, Serializer};

use super::rounding::round1;

/// A percentage of matched over total, or "n/a" when nothing was counted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    /// Percentage in `0.0..=100.0`, rounded to one decimal
    Percent(f64),
    NotApplicable,
}

impl Rate {
    /// `matched / total * 100`; a zero total is not applicable, never a
    /// division by zero
    pub fn of(matched: usize, total: usize) -> Self {
        if total == 0 {
            Rate::NotApplicable
        } else {
            Rate::Percent(round1(matched as f64 / total as f64 * 100.0))
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            Rate::Percent(p) => Some(*p),
            Rate::NotApplicable => None,
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::Percent(p) => write!(f, "{}%", p),
            Rate::NotApplicable => write!(f, "n/a"),
        }
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rate::Percent(p) => serializer.serialize_f64(*p),
            Rate::NotApplicable => serializer.serialize_str("n/a"),
        }
    }
}
