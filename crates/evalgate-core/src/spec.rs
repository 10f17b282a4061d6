//! Run identity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::RunConfig;

/// Stable identity of a run configuration.
///
/// Two runs with the same model, endpoint, task, sample limit, concurrency,
/// timeout and filter share a digest, so reports from repeated runs can be
/// grouped and compared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSpec {
    /// SHA-256 hex digest of the canonical configuration fields.
    pub config_digest: String,
    pub model: String,
    pub task: String,
}

impl RunSpec {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            config_digest: compute_config_digest(config),
            model: config.model.clone(),
            task: config.task.clone(),
        }
    }

    /// First 12 hex characters of the digest, for log lines.
    pub fn short_digest(&self) -> &str {
        &self.config_digest[..12.min(self.config_digest.len())]
    }
}

/// Hash the configuration fields in a fixed order, NUL-separated.
fn compute_config_digest(config: &RunConfig) -> String {
    let sample_limit = config.sample_limit.to_string();
    let concurrency = config.concurrency.to_string();
    let timeout = config.timeout_secs.to_string();
    let fields: [&str; 7] = [
        &config.model,
        &config.base_url,
        &config.task,
        &sample_limit,
        &concurrency,
        &timeout,
        &config.filter_key,
    ];

    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}
