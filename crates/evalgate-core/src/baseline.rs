//! Expected-baseline table.
//!
//! Maps a model identity to the score it is known to reach on the configured
//! task. The table is a plain read-only value handed to the gate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{GateError, Result};

/// Known-good scores per model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BaselineTable {
    entries: BTreeMap<String, f64>,
}

impl BaselineTable {
    /// Recorded gsm8k strict-match scores.
    pub fn standard() -> Self {
        let entries = [
            ("Qwen/Qwen3-0.6B", 0.41),
            ("deepseek-ai/deepseek-vl2-small", 0.59),
            ("deepseek-ai/deepseek-vl2-tiny", 0.19),
            ("deepseek-ai/DeepSeek-V2-Lite-Chat", 0.65),
        ]
        .into_iter()
        .map(|(model, score)| (model.to_string(), score))
        .collect();
        Self { entries }
    }

    /// An empty table; every model is untracked.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table, rejecting scores outside `0.0..=1.0`.
    pub fn from_entries<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (model, score) in entries {
            let model = model.into();
            if model.trim().is_empty() {
                return Err(GateError::InvalidConfig(
                    "baseline model name must not be empty".into(),
                ));
            }
            if !(0.0..=1.0).contains(&score) {
                return Err(GateError::InvalidConfig(format!(
                    "baseline for '{}' must be within 0.0..=1.0, got {}",
                    model, score
                )));
            }
            map.insert(model, score);
        }
        Ok(Self { entries: map })
    }

    /// Expected score for `model`, if one is recorded.
    pub fn expected(&self, model: &str) -> Option<f64> {
        self.entries.get(model).copied()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.entries.contains_key(model)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
