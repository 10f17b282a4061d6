//! Error taxonomy for evalgate.
//!
//! Variants fall into four groups: connectivity and transport failures,
//! structural problems in collaborator output, harness process failures, and
//! the accuracy mismatch itself. Only [`GateError::AccuracyMismatch`] means
//! "the model got worse"; everything else means the check could not run.

/// Errors produced while probing, evaluating or gating a run.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("connection failed: {0}")]
    Connectivity(String),

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("metric '{filter_key}' missing from results for task '{task}'")]
    MissingMetric { task: String, filter_key: String },

    #[error("malformed harness results: {0}")]
    MalformedResults(String),

    #[error("failed to start harness '{command}': {reason}")]
    HarnessSpawn { command: String, reason: String },

    #[error("harness exited with code {exit_code}: {stderr}")]
    HarnessFailed { exit_code: i32, stderr: String },

    #[error("harness timed out after {secs} seconds")]
    HarnessTimeout { secs: u64 },

    #[error("no expected value recorded for model '{0}'")]
    MissingBaseline(String),

    #[error("Expected: {expected} | Measured: {measured} (tolerance {tolerance})")]
    AccuracyMismatch {
        expected: f64,
        measured: f64,
        tolerance: f64,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GateError {
    /// Whether this error is a measured accuracy regression rather than a
    /// failure to run the check at all.
    pub fn is_accuracy_mismatch(&self) -> bool {
        matches!(self, GateError::AccuracyMismatch { .. })
    }

    /// Whether the error came from the shape of collaborator output.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GateError::MissingMetric { .. }
                | GateError::MalformedResults(_)
                | GateError::MalformedResponse(_)
        )
    }
}

/// Result type for evalgate operations.
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_mismatch_message_carries_both_values() {
        let err = GateError::AccuracyMismatch {
            expected: 0.41,
            measured: 0.3,
            tolerance: 0.03,
        };
        let msg = err.to_string();
        assert!(msg.contains("Expected: 0.41"));
        assert!(msg.contains("Measured: 0.3"));
        assert!(err.is_accuracy_mismatch());
        assert!(!err.is_structural());
    }

    #[test]
    fn missing_metric_is_structural() {
        let err = GateError::MissingMetric {
            task: "gsm8k".to_string(),
            filter_key: "exact_match,strict-match".to_string(),
        };
        assert!(err.is_structural());
        assert!(!err.is_accuracy_mismatch());
        assert!(err.to_string().contains("gsm8k"));
    }

    #[test]
    fn http_status_display() {
        let err = GateError::HttpStatus {
            status: 503,
            url: "http://localhost:8192/v1/completions".to_string(),
            body: "overloaded".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("overloaded"));
        assert!(!err.is_structural());
    }
}
