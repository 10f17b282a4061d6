//! evalgate core library
//!
//! Domain types for an accuracy regression check against an OpenAI-compatible
//! completions service: run configuration, the expected-baseline table,
//! tolerance selection, the harness contract and the accuracy gate.

pub mod baseline;
pub mod config;
pub mod error;
pub mod gate;
pub mod harness;
pub mod obs;
pub mod report;
pub mod spec;
pub mod telemetry;
pub mod tolerance;

pub use baseline::BaselineTable;
pub use config::RunConfig;
pub use error::{GateError, Result};
pub use gate::{judge, AccuracyGate, GateOutcome};
pub use harness::{EvalHarness, HarnessRequest, HarnessResults};
pub use obs::run_span;
pub use report::GateReport;
pub use spec::RunSpec;
pub use telemetry::init_tracing;
pub use tolerance::{SampleScope, Tolerance, TolerancePolicy, NARROW_TOLERANCE, WIDE_TOLERANCE};

/// evalgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
