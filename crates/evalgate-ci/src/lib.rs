//! evalgate CI - accuracy regression checks against a live service
//!
//! Provides:
//! - A smoke probe for an OpenAI-compatible completions endpoint
//! - A subprocess-backed benchmark harness
//! - A pipeline that probes, evaluates and gates a single run

pub mod fakes;
pub mod harness;
pub mod pipeline;
pub mod probe;

// Re-export key types
pub use harness::CommandHarness;
pub use pipeline::{AccuracyPipeline, PipelineResult};
pub use probe::{CompletionsClient, ProbeResult, DEFAULT_API_KEY, SIMPLE_PROMPT};
