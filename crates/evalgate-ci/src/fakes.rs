//! In-memory harness doubles for tests.

use async_trait::async_trait;
use evalgate_core::{EvalHarness, GateError, HarnessRequest, HarnessResults, Result};
use serde_json::{json, Value};
use std::sync::Mutex;

/// Returns the same canned results for every request and records what it
/// was asked to run.
pub struct StaticHarness {
    results: Value,
    requests: Mutex<Vec<HarnessRequest>>,
}

impl StaticHarness {
    pub fn new(results: Value) -> Self {
        Self {
            results,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Results holding a single metric for a single task.
    pub fn with_metric(task: &str, filter_key: &str, value: f64) -> Self {
        Self::new(json!({ "results": { task: { filter_key: value } } }))
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<HarnessRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EvalHarness for StaticHarness {
    fn name(&self) -> &str {
        "static"
    }

    async fn evaluate(&self, request: &HarnessRequest) -> Result<HarnessResults> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(HarnessResults::new(self.results.clone()))
    }
}

/// Fails every request with a connectivity error.
pub struct UnreachableHarness {
    message: String,
}

impl UnreachableHarness {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl EvalHarness for UnreachableHarness {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn evaluate(&self, _request: &HarnessRequest) -> Result<HarnessResults> {
        Err(GateError::Connectivity(self.message.clone()))
    }
}
