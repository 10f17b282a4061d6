//! Gate report.
//!
//! A [`GateReport`] records one completed run: its identity, the settings
//! that shaped the verdict, and the outcome. It is printed as pretty JSON or
//! as a one-line summary; nothing is written to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::error::Result;
use crate::gate::GateOutcome;
use crate::spec::RunSpec;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Summary of one completed evaluation, suitable for CI output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateReport {
    pub schema_version: String,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub config_digest: String,
    pub model: String,
    pub task: String,
    pub filter_key: String,
    pub sample_limit: u32,
    pub outcome: GateOutcome,
}

impl GateReport {
    pub fn new(run_id: Uuid, spec: &RunSpec, config: &RunConfig, outcome: GateOutcome) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            run_id,
            generated_at: Utc::now(),
            config_digest: spec.config_digest.clone(),
            model: config.model.clone(),
            task: config.task.clone(),
            filter_key: config.filter_key.clone(),
            sample_limit: config.sample_limit,
            outcome,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One-paragraph human summary.
    pub fn render_summary(&self) -> String {
        let limit = if self.sample_limit == 0 {
            "full dataset".to_string()
        } else {
            format!("limit {}", self.sample_limit)
        };
        let head = format!(
            "{} on {} [{}] ({})",
            self.model, self.task, self.filter_key, limit
        );
        match &self.outcome {
            GateOutcome::Passed {
                expected,
                measured,
                tolerance,
            } => format!(
                "PASS {}: measured {:.4}, expected {:.4} ± {}",
                head, measured, expected, tolerance.width
            ),
            GateOutcome::Failed {
                expected,
                measured,
                tolerance,
            } => format!(
                "FAIL {}: measured {:.4}, expected {:.4} ± {}",
                head, measured, expected, tolerance.width
            ),
            GateOutcome::Skipped { measured } => format!(
                "SKIP {}: measured {:.4}, no expected value recorded",
                head, measured
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tolerance::TolerancePolicy;

    fn report(outcome: GateOutcome, sample_limit: u32) -> GateReport {
        let config = RunConfig::default().with_sample_limit(sample_limit);
        let spec = RunSpec::new(&config);
        GateReport::new(
            Uuid::parse_str("11111111-1111-1111-1111-111111111111").expect("valid UUID"),
            &spec,
            &config,
            outcome,
        )
    }

    #[test]
    fn report_schema_has_expected_keys() {
        let r = report(GateOutcome::Skipped { measured: 0.5 }, 10);
        let json: serde_json::Value =
            serde_json::from_str(&r.to_json_pretty().unwrap()).unwrap();
        for key in [
            "schema_version",
            "run_id",
            "generated_at",
            "config_digest",
            "model",
            "task",
            "filter_key",
            "sample_limit",
            "outcome",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["outcome"]["verdict"], "skipped");
    }

    #[test]
    fn summary_marks_pass_and_fail() {
        let tolerance = TolerancePolicy::standard().select(0);
        let pass = report(
            GateOutcome::Passed {
                expected: 0.41,
                measured: 0.42,
                tolerance,
            },
            0,
        );
        assert!(pass.passed());
        assert!(pass.render_summary().starts_with("PASS"));
        assert!(pass.render_summary().contains("full dataset"));

        let fail = report(
            GateOutcome::Failed {
                expected: 0.41,
                measured: 0.30,
                tolerance,
            },
            0,
        );
        assert!(!fail.passed());
        assert!(fail.render_summary().starts_with("FAIL"));
    }

    #[test]
    fn summary_for_skip_mentions_missing_expected_value() {
        let r = report(GateOutcome::Skipped { measured: 0.1 }, 5);
        let summary = r.render_summary();
        assert!(summary.starts_with("SKIP"));
        assert!(summary.contains("limit 5"));
        assert!(summary.contains("no expected value"));
    }
}
