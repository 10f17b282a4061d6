//! Contract with the external benchmark harness.
//!
//! The harness takes a model kind, a model-args string, a task name and an
//! optional sample limit, and returns results nested as
//! `results -> <task> -> <metric> -> number`. Everything about how it scores
//! examples is opaque to evalgate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{RunConfig, MODEL_KIND};
use crate::error::{GateError, Result};

/// One harness invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessRequest {
    pub model_kind: String,
    pub model_args: String,
    pub task: String,
    /// `None` evaluates the full dataset.
    pub limit: Option<u32>,
}

impl HarnessRequest {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            model_kind: MODEL_KIND.to_string(),
            model_args: config.model_args(),
            task: config.task.clone(),
            limit: config.limit(),
        }
    }

    /// Command-line form understood by the harness driver.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--model".to_string(),
            self.model_kind.clone(),
            "--model_args".to_string(),
            self.model_args.clone(),
            "--tasks".to_string(),
            self.task.clone(),
        ];
        if let Some(limit) = self.limit {
            args.push("--limit".to_string());
            args.push(limit.to_string());
        }
        args
    }
}

/// Structured output of one harness invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct HarnessResults(Value);

impl HarnessResults {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Read the score at `results[task][filter_key]`.
    ///
    /// A missing task or key is a [`GateError::MissingMetric`]; a value of the
    /// wrong shape is a [`GateError::MalformedResults`]. Neither is ever
    /// treated as a score of zero.
    pub fn metric(&self, task: &str, filter_key: &str) -> Result<f64> {
        let results = self
            .0
            .get("results")
            .ok_or_else(|| GateError::MalformedResults("no 'results' section".into()))?;
        let results = results.as_object().ok_or_else(|| {
            GateError::MalformedResults("'results' is not an object".into())
        })?;

        let missing = || GateError::MissingMetric {
            task: task.to_string(),
            filter_key: filter_key.to_string(),
        };

        let task_results = results.get(task).ok_or_else(missing)?;
        let task_results = task_results.as_object().ok_or_else(|| {
            GateError::MalformedResults(format!("results for task '{}' are not an object", task))
        })?;

        let value = task_results.get(filter_key).ok_or_else(missing)?;
        value.as_f64().ok_or_else(|| {
            GateError::MalformedResults(format!(
                "metric '{}' for task '{}' is not a number: {}",
                filter_key, task, value
            ))
        })
    }
}

/// Something that can run a benchmark task against the target service.
///
/// Implementations block for the whole evaluation; there is no streaming of
/// per-example progress.
#[async_trait]
pub trait EvalHarness: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn evaluate(&self, request: &HarnessRequest) -> Result<HarnessResults>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results() -> HarnessResults {
        HarnessResults::new(json!({
            "results": {
                "gsm8k": {
                    "alias": "gsm8k",
                    "exact_match,strict-match": 0.4,
                    "exact_match_stderr,strict-match": "N/A",
                    "exact_match,flexible-extract": 0.45
                }
            }
        }))
    }

    #[test]
    fn reads_configured_metric() {
        let value = results().metric("gsm8k", "exact_match,strict-match").unwrap();
        assert_eq!(value, 0.4);
        let value = results()
            .metric("gsm8k", "exact_match,flexible-extract")
            .unwrap();
        assert_eq!(value, 0.45);
    }

    #[test]
    fn missing_filter_key_is_structural_not_zero() {
        let err = results().metric("gsm8k", "exact_match,no-such-filter").unwrap_err();
        assert!(matches!(err, GateError::MissingMetric { .. }));
    }

    #[test]
    fn missing_task_is_structural() {
        let err = results().metric("mmlu", "exact_match,strict-match").unwrap_err();
        assert!(matches!(err, GateError::MissingMetric { ref task, .. } if task == "mmlu"));
    }

    #[test]
    fn non_numeric_metric_is_malformed() {
        let err = results()
            .metric("gsm8k", "exact_match_stderr,strict-match")
            .unwrap_err();
        assert!(matches!(err, GateError::MalformedResults(_)));
    }

    #[test]
    fn missing_results_section_is_malformed() {
        let err = HarnessResults::new(json!({"gsm8k": {}}))
            .metric("gsm8k", "exact_match,strict-match")
            .unwrap_err();
        assert!(matches!(err, GateError::MalformedResults(_)));
    }

    #[test]
    fn request_from_config_uses_local_completions() {
        let request = HarnessRequest::from_config(&RunConfig::default());
        assert_eq!(request.model_kind, "local-completions");
        assert_eq!(request.task, "gsm8k");
        assert_eq!(request.limit, Some(10));
        assert!(request.model_args.contains("tokenized_requests=False"));
    }

    #[test]
    fn full_dataset_request_omits_limit_arg() {
        let request = HarnessRequest::from_config(&RunConfig::default().with_sample_limit(0));
        assert_eq!(request.limit, None);
        let args = request.to_args();
        assert!(!args.contains(&"--limit".to_string()));
        assert_eq!(args[0], "--model");
        assert_eq!(args[1], "local-completions");
    }

    #[test]
    fn limited_request_appends_limit_arg() {
        let args = HarnessRequest::from_config(&RunConfig::default()).to_args();
        let pos = args.iter().position(|a| a == "--limit").unwrap();
        assert_eq!(args[pos + 1], "10");
    }
}
