//! Accuracy gate.
//!
//! Compares a measured score against the expected baseline for a model,
//! using a tolerance chosen from the run's sample limit. The gate is a pure
//! function of its inputs; logging of the outcome is left to the caller.
//!
//! Models without a recorded baseline are *skipped*, not failed. That keeps
//! the check usable for new models, at the cost of offering no protection
//! for them until a baseline is recorded. [`AccuracyGate::require_baseline`]
//! turns the skip into an error for callers that want the stricter rule.

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineTable;
use crate::error::{GateError, Result};
use crate::tolerance::{Tolerance, TolerancePolicy};

/// What the gate decided for one measured score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GateOutcome {
    /// Measured score is strictly inside the band around the baseline.
    Passed {
        expected: f64,
        measured: f64,
        tolerance: Tolerance,
    },
    /// Measured score is on or outside the band.
    Failed {
        expected: f64,
        measured: f64,
        tolerance: Tolerance,
    },
    /// No baseline for this model; reported but not judged.
    Skipped { measured: f64 },
}

impl GateOutcome {
    /// Whether the run counts as successful. Skips count as success.
    pub fn is_success(&self) -> bool {
        !matches!(self, GateOutcome::Failed { .. })
    }

    pub fn measured(&self) -> f64 {
        match self {
            GateOutcome::Passed { measured, .. }
            | GateOutcome::Failed { measured, .. }
            | GateOutcome::Skipped { measured } => *measured,
        }
    }

    pub fn expected(&self) -> Option<f64> {
        match self {
            GateOutcome::Passed { expected, .. } | GateOutcome::Failed { expected, .. } => {
                Some(*expected)
            }
            GateOutcome::Skipped { .. } => None,
        }
    }

    pub fn tolerance(&self) -> Option<Tolerance> {
        match self {
            GateOutcome::Passed { tolerance, .. } | GateOutcome::Failed { tolerance, .. } => {
                Some(*tolerance)
            }
            GateOutcome::Skipped { .. } => None,
        }
    }

    /// Turn a failed outcome into [`GateError::AccuracyMismatch`].
    pub fn ensure_passed(&self) -> Result<()> {
        match self {
            GateOutcome::Failed {
                expected,
                measured,
                tolerance,
            } => Err(GateError::AccuracyMismatch {
                expected: *expected,
                measured: *measured,
                tolerance: tolerance.width,
            }),
            _ => Ok(()),
        }
    }
}

/// Baseline table plus tolerance policy.
#[derive(Debug, Clone)]
pub struct AccuracyGate {
    baselines: BaselineTable,
    policy: TolerancePolicy,
    require_baseline: bool,
}

impl Default for AccuracyGate {
    fn default() -> Self {
        Self::new(BaselineTable::standard())
    }
}

impl AccuracyGate {
    pub fn new(baselines: BaselineTable) -> Self {
        Self {
            baselines,
            policy: TolerancePolicy::standard(),
            require_baseline: false,
        }
    }

    pub fn with_policy(mut self, policy: TolerancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Treat a model without a baseline as an error instead of a skip.
    pub fn require_baseline(mut self, required: bool) -> Self {
        self.require_baseline = required;
        self
    }

    pub fn baselines(&self) -> &BaselineTable {
        &self.baselines
    }

    pub fn policy(&self) -> &TolerancePolicy {
        &self.policy
    }

    /// Judge `measured` for `model` on a run with `sample_limit`.
    ///
    /// Returns `Err` only when a baseline is required and missing; an
    /// out-of-band score is `Ok(GateOutcome::Failed { .. })`.
    pub fn evaluate(&self, model: &str, sample_limit: u32, measured: f64) -> Result<GateOutcome> {
        let Some(expected) = self.baselines.expected(model) else {
            if self.require_baseline {
                return Err(GateError::MissingBaseline(model.to_string()));
            }
            return Ok(GateOutcome::Skipped { measured });
        };

        let tolerance = self.policy.select(sample_limit);
        Ok(judge(expected, measured, tolerance))
    }
}

/// Compare one score against one baseline.
pub fn judge(expected: f64, measured: f64, tolerance: Tolerance) -> GateOutcome {
    if tolerance.admits(expected, measured) {
        GateOutcome::Passed {
            expected,
            measured,
            tolerance,
        }
    } else {
        GateOutcome::Failed {
            expected,
            measured,
            tolerance,
        }
    }
}
