//! Run configuration.
//!
//! A [`RunConfig`] is assembled once at process start, from defaults and the
//! environment, and is never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};

/// Root of the OpenAI-compatible API exposed by the service under test.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8192/v1";

/// Model evaluated when `TEST_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "Qwen/Qwen3-0.6B";

/// Grade-school math word problems.
pub const DEFAULT_TASK: &str = "gsm8k";

/// Strict final-answer exact match.
pub const DEFAULT_FILTER_KEY: &str = "exact_match,strict-match";

/// Examples evaluated when `NUM_SAMPLES` is unset.
pub const DEFAULT_SAMPLE_LIMIT: u32 = 10;

/// Higher values cause session-state corruption in the reference harness.
pub const DEFAULT_CONCURRENCY: u32 = 1;

/// Per-request timeout handed to the harness.
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

/// Model kind the harness uses for a remote completions endpoint.
pub const MODEL_KIND: &str = "local-completions";

pub const ENV_MODEL: &str = "TEST_MODEL";
pub const ENV_NUM_SAMPLES: &str = "NUM_SAMPLES";
pub const ENV_BASE_URL: &str = "EVALGATE_BASE_URL";
pub const ENV_TASK: &str = "EVALGATE_TASK";
pub const ENV_FILTER: &str = "EVALGATE_FILTER";
pub const ENV_TIMEOUT_SECS: &str = "EVALGATE_TIMEOUT_SECS";

/// Immutable description of a single accuracy run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
    /// Model identity under test; selects the baseline.
    pub model: String,

    /// Endpoint root, e.g. `http://localhost:8192/v1`.
    pub base_url: String,

    /// Benchmark task known to the harness.
    pub task: String,

    /// Number of examples to evaluate. `0` means the full dataset.
    pub sample_limit: u32,

    /// Concurrent requests the harness may issue.
    pub concurrency: u32,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Scoring variant read from the task's results.
    pub filter_key: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            task: DEFAULT_TASK.to_string(),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            filter_key: DEFAULT_FILTER_KEY.to_string(),
        }
    }
}

impl RunConfig {
    /// Build a config from process environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Empty or whitespace-only values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(raw) = get(ENV_NUM_SAMPLES) {
            config.sample_limit = parse_number(ENV_NUM_SAMPLES, &raw)?;
        }
        if let Some(url) = get(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(task) = get(ENV_TASK) {
            config.task = task;
        }
        if let Some(filter) = get(ENV_FILTER) {
            config.filter_key = filter;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            config.timeout_secs = parse_number(ENV_TIMEOUT_SECS, &raw)?;
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    pub fn with_sample_limit(mut self, sample_limit: u32) -> Self {
        self.sample_limit = sample_limit;
        self
    }

    pub fn with_concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_filter_key(mut self, filter_key: impl Into<String>) -> Self {
        self.filter_key = filter_key.into();
        self
    }

    /// Reject configurations the harness cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(GateError::InvalidConfig("model must not be empty".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(GateError::InvalidConfig(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.task.trim().is_empty() {
            return Err(GateError::InvalidConfig("task must not be empty".into()));
        }
        if self.filter_key.trim().is_empty() {
            return Err(GateError::InvalidConfig(
                "filter_key must not be empty".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(GateError::InvalidConfig(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(GateError::InvalidConfig(
                "timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Full URL of the completions route.
    pub fn completions_url(&self) -> String {
        format!("{}/completions", self.base_url.trim_end_matches('/'))
    }

    /// Harness sample limit: `None` evaluates the whole dataset.
    pub fn limit(&self) -> Option<u32> {
        (self.sample_limit > 0).then_some(self.sample_limit)
    }

    /// Whether this run evaluates a reduced subset of the task.
    pub fn is_limited(&self) -> bool {
        self.sample_limit > 0
    }

    /// Comma-separated model arguments for the harness.
    ///
    /// Tokenized requests are always disabled: the target is a live HTTP
    /// service and must receive raw text.
    pub fn model_args(&self) -> String {
        format!(
            "model={},base_url={},num_concurrent={},tokenized_requests=False,timeout={}",
            self.model,
            self.completions_url(),
            self.concurrency,
            self.timeout_secs
        )
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|_| {
        GateError::InvalidConfig(format!(
            "{} must be a non-negative integer, got '{}'",
            key, raw
        ))
    })
}
