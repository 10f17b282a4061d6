//! evalgate - accuracy regression gate CLI
//!
//! Checks that a running OpenAI-compatible completions service still scores
//! within tolerance of a known-good baseline on a benchmark task.
//!
//! ## Commands
//!
//! - `probe`: send the fixed smoke prompt and print the completion
//! - `run`: probe, run the benchmark harness, and gate the score
//! - `baselines`: list the expected-baseline table
//! - `tolerance`: show which tolerance a sample count selects
//!
//! Exit codes: 0 on success (including a skipped gate for an untracked
//! model), 1 on an accuracy mismatch, 2 on any other error.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use evalgate_ci::probe::run_probe;
use evalgate_ci::{AccuracyPipeline, CommandHarness, CompletionsClient, DEFAULT_API_KEY};
use evalgate_core::{
    init_tracing, AccuracyGate, BaselineTable, GateError, RunConfig, TolerancePolicy,
};
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "evalgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Accuracy regression gate for OpenAI-compatible completion services", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send the fixed smoke prompt and print the raw completion
    Probe {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Probe the service, run the benchmark and gate the measured score
    Run(EvalArgs),

    /// List models with a recorded expected score
    Baselines,

    /// Show the tolerance selected for a sample count
    Tolerance {
        /// Examples evaluated (0 = full dataset)
        #[arg(long, default_value_t = 0)]
        num_samples: u32,
    },
}

/// Where the service lives and how to talk to it.
#[derive(Args, Debug, Clone)]
struct TargetArgs {
    /// Model under test [env: TEST_MODEL]
    #[arg(short, long)]
    model: Option<String>,

    /// API root, e.g. http://localhost:8192/v1 [env: EVALGATE_BASE_URL]
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds [env: EVALGATE_TIMEOUT_SECS]
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// API key sent as a bearer token
    #[arg(long, env = "EVALGATE_API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    api_key: String,
}

#[derive(Args, Debug, Clone)]
struct EvalArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Examples to evaluate, 0 = full dataset [env: NUM_SAMPLES]
    #[arg(short = 'n', long)]
    num_samples: Option<u32>,

    /// Benchmark task [env: EVALGATE_TASK]
    #[arg(long)]
    task: Option<String>,

    /// Metric key read from the task results [env: EVALGATE_FILTER]
    #[arg(long)]
    filter: Option<String>,

    /// Concurrent harness requests; values above 1 break the lm_eval session
    #[arg(long)]
    concurrency: Option<u32>,

    /// Harness command line (whitespace-separated); defaults to the embedded lm_eval driver
    #[arg(long, env = "EVALGATE_HARNESS_CMD")]
    harness_cmd: Option<String>,

    /// Wall-clock limit for the harness process in seconds (0 = none)
    #[arg(long, default_value_t = 0)]
    harness_timeout_secs: u64,

    /// Skip the smoke probe
    #[arg(long)]
    skip_probe: bool,

    /// Fail instead of skipping when the model has no recorded baseline
    #[arg(long)]
    require_baseline: bool,

    /// Print the gate report as JSON instead of a one-line summary
    #[arg(long)]
    json_report: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let outcome = match cli.command {
        Commands::Probe { target } => cmd_probe(&target).await,
        Commands::Run(args) => cmd_run(&args).await,
        Commands::Baselines => cmd_baselines(),
        Commands::Tolerance { num_samples } => cmd_tolerance(num_samples),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            exit_code_for(&err)
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<GateError>() {
        Some(e) if e.is_accuracy_mismatch() => ExitCode::from(1),
        _ => ExitCode::from(2),
    }
}

/// Environment first, then command-line overrides.
fn resolve_config(target: &TargetArgs, eval: Option<&EvalArgs>) -> Result<RunConfig> {
    let base = RunConfig::from_env().context("Invalid environment configuration")?;
    let config = apply_overrides(base, target, eval);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(mut config: RunConfig, target: &TargetArgs, eval: Option<&EvalArgs>) -> RunConfig {
    if let Some(model) = &target.model {
        config = config.with_model(model.clone());
    }
    if let Some(url) = &target.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(timeout) = target.timeout_secs {
        config = config.with_timeout_secs(timeout);
    }
    if let Some(eval) = eval {
        if let Some(n) = eval.num_samples {
            config = config.with_sample_limit(n);
        }
        if let Some(task) = &eval.task {
            config = config.with_task(task.clone());
        }
        if let Some(filter) = &eval.filter {
            config = config.with_filter_key(filter.clone());
        }
        if let Some(c) = eval.concurrency {
            config = config.with_concurrency(c);
        }
    }
    config
}

fn build_harness(args: &EvalArgs) -> Result<CommandHarness> {
    let harness = match &args.harness_cmd {
        Some(line) => CommandHarness::from_command_line(line, args.harness_timeout_secs)?,
        None => CommandHarness::default().with_timeout_secs(args.harness_timeout_secs),
    };
    Ok(harness)
}

async fn cmd_probe(target: &TargetArgs) -> Result<()> {
    let config = resolve_config(target, None)?;
    let client = CompletionsClient::from_config(&config, &target.api_key)?;
    let mut stdout = std::io::stdout();

    let result = run_probe(&client, &config.model, &mut stdout)
        .await
        .with_context(|| format!("Probe of {} failed", client.completions_url()))?;
    info!(latency_ms = result.latency_ms, "Probe succeeded");
    Ok(())
}

async fn cmd_run(args: &EvalArgs) -> Result<()> {
    let config = resolve_config(&args.target, Some(args))?;
    let gate = AccuracyGate::default().require_baseline(args.require_baseline);
    let harness = build_harness(args)?;
    let client = if args.skip_probe {
        None
    } else {
        Some(CompletionsClient::from_config(&config, &args.target.api_key)?)
    };

    info!(
        model = %config.model,
        task = %config.task,
        sample_limit = config.sample_limit,
        "Starting accuracy run"
    );

    let mut stdout = std::io::stdout();
    let result = AccuracyPipeline::run(&config, &gate, client.as_ref(), &harness, &mut stdout)
        .await
        .context("Accuracy run did not complete")?;

    if args.json_report {
        println!("{}", result.report.to_json_pretty()?);
    } else {
        println!("{}", result.report.render_summary());
    }

    result.ensure_passed()?;
    Ok(())
}

fn cmd_baselines() -> Result<()> {
    let table = BaselineTable::standard();
    println!("{:<40} EXPECTED", "MODEL");
    for (model, expected) in table.iter() {
        println!("{:<40} {:.2}", model, expected);
    }
    Ok(())
}

fn cmd_tolerance(num_samples: u32) -> Result<()> {
    let tolerance = TolerancePolicy::standard().select(num_samples);
    println!(
        "{} samples -> {:?} scope, tolerance ±{}",
        num_samples, tolerance.scope, tolerance.width
    );
    Ok(())
}
