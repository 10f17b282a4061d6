//! Structured lifecycle events for an accuracy run.
//!
//! Each function emits one tracing event with a stable `event` field so log
//! pipelines can key on it. Run work inside [`run_span`] to tag every event
//! with its run id and model.

use tracing::{info, warn};

use crate::gate::GateOutcome;

/// Span for one run. Attach to futures with `tracing::Instrument`.
pub fn run_span(run_id: &str, model: &str) -> tracing::Span {
    tracing::info_span!("evalgate.run", run_id = %run_id, model = %model)
}

pub fn emit_run_started(config_digest: &str, task: &str, sample_limit: u32) {
    info!(
        event = "evalgate.run.started",
        config_digest = %config_digest,
        task = %task,
        sample_limit = sample_limit,
    );
}

pub fn emit_probe_completed(url: &str, status: u16, latency_ms: u64) {
    info!(
        event = "evalgate.probe.completed",
        url = %url,
        status = status,
        latency_ms = latency_ms,
    );
}

pub fn emit_harness_started(harness: &str, task: &str, limit: Option<u32>) {
    info!(
        event = "evalgate.harness.started",
        harness = %harness,
        task = %task,
        limit = ?limit,
    );
}

pub fn emit_harness_finished(harness: &str, duration_ms: u64) {
    info!(
        event = "evalgate.harness.finished",
        harness = %harness,
        duration_ms = duration_ms,
    );
}

/// Emit the gate decision. Skips are logged at warn level.
pub fn emit_gate_evaluated(model: &str, outcome: &GateOutcome) {
    match outcome {
        GateOutcome::Skipped { measured } => {
            warn!(
                event = "evalgate.gate.skipped",
                model = %model,
                measured = measured,
                "No expected value for {}, skipping check.",
                model
            );
        }
        GateOutcome::Passed {
            expected,
            measured,
            tolerance,
        }
        | GateOutcome::Failed {
            expected,
            measured,
            tolerance,
        } => {
            info!(
                event = "evalgate.gate.evaluated",
                model = %model,
                expected = expected,
                measured = measured,
                tolerance = tolerance.width,
                passed = outcome.is_success(),
            );
        }
    }
}
