//! Probe, evaluate and gate in one linear pass.

use crate::probe::{run_probe, CompletionsClient, ProbeResult};
use evalgate_core::config::DEFAULT_CONCURRENCY;
use evalgate_core::{
    obs, AccuracyGate, EvalHarness, GateOutcome, GateReport, HarnessRequest, Result, RunConfig,
    RunSpec,
};
use std::io::Write;
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Result of a complete accuracy run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub report: GateReport,

    /// Present when the smoke probe ran.
    pub probe: Option<ProbeResult>,

    /// Wall-clock time spent inside the harness.
    pub harness_duration_ms: u64,
}

impl PipelineResult {
    pub fn outcome(&self) -> &GateOutcome {
        &self.report.outcome
    }

    /// Fail with [`evalgate_core::GateError::AccuracyMismatch`] if the gate failed.
    pub fn ensure_passed(&self) -> Result<()> {
        self.report.outcome.ensure_passed()
    }
}

/// Accuracy run orchestrator.
pub struct AccuracyPipeline;

impl AccuracyPipeline {
    /// Run the check.
    ///
    /// Order: validate config, optional probe, one harness invocation, metric
    /// extraction, gate. Probe, harness and structural errors abort the run
    /// and are returned as `Err`. An accuracy mismatch is *not* an `Err`
    /// here; it is recorded in the report and surfaced by
    /// [`PipelineResult::ensure_passed`].
    ///
    /// Observational output (the probe dump and the missing-baseline
    /// warning) is written to `out`.
    pub async fn run(
        config: &RunConfig,
        gate: &AccuracyGate,
        probe: Option<&CompletionsClient>,
        harness: &dyn EvalHarness,
        out: &mut (dyn Write + Send),
    ) -> Result<PipelineResult> {
        config.validate()?;

        let run_id = Uuid::new_v4();
        let span = obs::run_span(&run_id.to_string(), &config.model);
        Self::run_inner(run_id, config, gate, probe, harness, out)
            .instrument(span)
            .await
    }

    async fn run_inner(
        run_id: Uuid,
        config: &RunConfig,
        gate: &AccuracyGate,
        probe: Option<&CompletionsClient>,
        harness: &dyn EvalHarness,
        out: &mut (dyn Write + Send),
    ) -> Result<PipelineResult> {
        let spec = RunSpec::new(config);
        obs::emit_run_started(&spec.config_digest, &config.task, config.sample_limit);

        if config.concurrency > DEFAULT_CONCURRENCY {
            warn!(
                concurrency = config.concurrency,
                "harness concurrency above {} is known to corrupt harness sessions",
                DEFAULT_CONCURRENCY
            );
        }

        let probe_result = match probe {
            Some(client) => Some(run_probe(client, &config.model, out).await?),
            None => {
                info!("Skipping smoke probe");
                None
            }
        };

        let request = HarnessRequest::from_config(config);
        obs::emit_harness_started(harness.name(), &request.task, request.limit);
        let start = Instant::now();
        let results = harness.evaluate(&request).await?;
        let harness_duration_ms = start.elapsed().as_millis() as u64;
        obs::emit_harness_finished(harness.name(), harness_duration_ms);

        let measured = results.metric(&config.task, &config.filter_key)?;
        let outcome = gate.evaluate(&config.model, config.sample_limit, measured)?;
        obs::emit_gate_evaluated(&config.model, &outcome);

        if let GateOutcome::Skipped { measured } = outcome {
            writeln!(
                out,
                "Warning: No expected value for {}, skipping check.",
                config.model
            )?;
            writeln!(out, "Measured value: {}", measured)?;
        }

        Ok(PipelineResult {
            report: GateReport::new(run_id, &spec, config, outcome),
            probe: probe_result,
            harness_duration_ms,
        })
    }
}
