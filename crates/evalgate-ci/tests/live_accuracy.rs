//! End-to-end accuracy check against a running service.
//!
//! Requires a completions service on `EVALGATE_BASE_URL` (default
//! `http://localhost:8192/v1`) and a Python environment with `lm_eval`.
//! Run with:
//!
//! ```text
//! TEST_MODEL=Qwen/Qwen3-0.6B NUM_SAMPLES=10 cargo test -p evalgate-ci --test live_accuracy -- --ignored
//! ```

use evalgate_ci::{AccuracyPipeline, CommandHarness, CompletionsClient, DEFAULT_API_KEY};
use evalgate_core::{init_tracing, AccuracyGate, RunConfig};
use tracing::Level;

#[tokio::test]
#[ignore = "needs a live completions service and lm_eval"]
async fn test_accuracy() {
    init_tracing(false, Level::INFO);

    let config = RunConfig::from_env().expect("config from environment");
    let client = CompletionsClient::from_config(&config, DEFAULT_API_KEY).expect("client");
    let harness = CommandHarness::default();
    let mut stdout = std::io::stdout();

    let result = AccuracyPipeline::run(
        &config,
        &AccuracyGate::default(),
        Some(&client),
        &harness,
        &mut stdout,
    )
    .await
    .expect("accuracy run failed");

    println!("{}", result.report.render_summary());
    if let Err(e) = result.ensure_passed() {
        panic!("{e}");
    }
}
