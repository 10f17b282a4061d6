//! Tolerance selection.
//!
//! Small samples have higher variance, so a limited run is judged against a
//! wider band than a full-dataset run. Selection depends only on whether the
//! sample limit is zero, never on the measured value.

use serde::{Deserialize, Serialize};

/// Allowed deviation for a full-dataset run.
pub const NARROW_TOLERANCE: f64 = 0.03;

/// Allowed deviation for a run over a limited subset.
pub const WIDE_TOLERANCE: f64 = 0.15;

/// Slack absorbed when comparing a deviation against the band width.
///
/// Scores are ratios of example counts, so a deviation within this of the
/// width is an edge value carrying float rounding, not a real score inside
/// the band.
pub const BOUNDARY_EPSILON: f64 = 1e-9;

/// How much of the task dataset a run covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SampleScope {
    /// Every example in the task (`sample_limit == 0`).
    Full,
    /// A capped subset (`sample_limit > 0`).
    Limited,
}

impl SampleScope {
    pub fn from_sample_limit(sample_limit: u32) -> Self {
        if sample_limit == 0 {
            SampleScope::Full
        } else {
            SampleScope::Limited
        }
    }
}

/// A concrete tolerance band width chosen for one run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Tolerance {
    pub scope: SampleScope,
    pub width: f64,
}

impl Tolerance {
    /// Open-interval membership: `expected - width < measured < expected + width`.
    ///
    /// A measured value on either boundary is outside the band, including
    /// edges such as `0.59 - 0.15` that f64 arithmetic lands just inside.
    /// NaN is never admitted.
    pub fn admits(&self, expected: f64, measured: f64) -> bool {
        (measured - expected).abs() < self.width - BOUNDARY_EPSILON
    }
}

/// Narrow/wide widths used to build a [`Tolerance`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TolerancePolicy {
    pub narrow: f64,
    pub wide: f64,
}

impl Default for TolerancePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl TolerancePolicy {
    /// 0.03 for full runs, 0.15 for limited runs.
    pub const fn standard() -> Self {
        Self {
            narrow: NARROW_TOLERANCE,
            wide: WIDE_TOLERANCE,
        }
    }

    pub const fn new(narrow: f64, wide: f64) -> Self {
        Self { narrow, wide }
    }

    /// Pick the band for a run with the given sample limit.
    pub fn select(&self, sample_limit: u32) -> Tolerance {
        let scope = SampleScope::from_sample_limit(sample_limit);
        let width = match scope {
            SampleScope::Full => self.narrow,
            SampleScope::Limited => self.wide,
        };
        Tolerance { scope, width }
    }
}
