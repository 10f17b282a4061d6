//! Harness execution as a subprocess.

use async_trait::async_trait;
use evalgate_core::{EvalHarness, GateError, HarnessRequest, HarnessResults, Result};
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Python driver for `lm_eval.simple_evaluate`.
///
/// Prints the `results` section as a single JSON line on stdout; the harness
/// library's own logging goes to stderr. Non-finite floats (an undefined
/// stderr on a tiny sample) become `null`, since JSON has no NaN.
pub const LM_EVAL_DRIVER: &str = r#"
import argparse, json, math, sys
import lm_eval

def finite(value):
    if isinstance(value, float) and not math.isfinite(value):
        return None
    if isinstance(value, dict):
        return {str(k): finite(v) for k, v in value.items()}
    if isinstance(value, (list, tuple)):
        return [finite(v) for v in value]
    return value

parser = argparse.ArgumentParser()
parser.add_argument("--model", required=True)
parser.add_argument("--model_args", required=True)
parser.add_argument("--tasks", required=True)
parser.add_argument("--limit", type=int, default=None)
args = parser.parse_args()

out = lm_eval.simple_evaluate(
    model=args.model,
    model_args=args.model_args,
    tasks=args.tasks,
    limit=args.limit,
)
results = finite(out["results"])
sys.stdout.write("\n" + json.dumps({"results": results}, default=str, allow_nan=False) + "\n")
"#;

/// Keep error messages readable when the harness dumps a long traceback.
const STDERR_TAIL_BYTES: usize = 4096;

/// Runs an external harness command and parses its JSON output.
///
/// The request is appended to `command` as `--model`, `--model_args`,
/// `--tasks` and optionally `--limit`. The last non-empty stdout line must be
/// a JSON object with a `results` section.
#[derive(Debug, Clone)]
pub struct CommandHarness {
    command: Vec<String>,
    timeout_secs: u64,
}

impl Default for CommandHarness {
    fn default() -> Self {
        Self::lm_eval("python3")
    }
}

impl CommandHarness {
    /// Custom harness command. `timeout_secs == 0` waits indefinitely.
    pub fn new(command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            command,
            timeout_secs,
        }
    }

    /// Embedded `lm_eval` driver run by the given Python interpreter.
    pub fn lm_eval(python: &str) -> Self {
        Self::new(
            vec![
                python.to_string(),
                "-c".to_string(),
                LM_EVAL_DRIVER.to_string(),
            ],
            0,
        )
    }

    /// Split a whitespace-separated command line. No shell quoting is applied.
    pub fn from_command_line(line: &str, timeout_secs: u64) -> Result<Self> {
        let command: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if command.is_empty() {
            return Err(GateError::InvalidConfig(
                "harness command must not be empty".into(),
            ));
        }
        Ok(Self::new(command, timeout_secs))
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("")
    }
}

#[async_trait]
impl EvalHarness for CommandHarness {
    fn name(&self) -> &str {
        self.program()
    }

    async fn evaluate(&self, request: &HarnessRequest) -> Result<HarnessResults> {
        let Some((exe, base_args)) = self.command.split_first() else {
            return Err(GateError::InvalidConfig(
                "harness command must not be empty".into(),
            ));
        };

        let child = Command::new(exe)
            .args(base_args)
            .args(request.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GateError::HarnessSpawn {
                command: exe.clone(),
                reason: e.to_string(),
            })?;

        let output = if self.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(self.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| GateError::HarnessTimeout {
                secs: self.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "harness exited"
        );

        if !output.status.success() {
            return Err(GateError::HarnessFailed {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: tail(&stderr, STDERR_TAIL_BYTES).to_string(),
            });
        }

        parse_harness_stdout(&stdout)
    }
}

/// Parse harness stdout: last non-empty line first, whole output as fallback.
pub fn parse_harness_stdout(stdout: &str) -> Result<HarnessResults> {
    let last_line = stdout.lines().rev().find(|l| !l.trim().is_empty());
    let parsed = last_line
        .and_then(|line| serde_json::from_str::<Value>(line).ok())
        .filter(Value::is_object)
        .or_else(|| serde_json::from_str::<Value>(stdout).ok().filter(Value::is_object));

    match parsed {
        Some(value) => Ok(HarnessResults::new(value)),
        None => Err(GateError::MalformedResults(format!(
            "harness did not print a JSON object (stdout: {:?})",
            tail(stdout, 512)
        ))),
    }
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_last_json_line_after_log_noise() {
        let stdout = "loading model...\n2024 progress\n{\"results\": {\"gsm8k\": {\"exact_match,strict-match\": 0.4}}}\n\n";
        let results = parse_harness_stdout(stdout).unwrap();
        assert_eq!(
            results.metric("gsm8k", "exact_match,strict-match").unwrap(),
            0.4
        );
    }

    #[test]
    fn parses_pretty_printed_object() {
        let stdout = "{\n  \"results\": {\n    \"gsm8k\": {\"acc\": 0.5}\n  }\n}\n";
        let results = parse_harness_stdout(stdout).unwrap();
        assert_eq!(results.metric("gsm8k", "acc").unwrap(), 0.5);
    }

    #[test]
    fn non_json_stdout_is_malformed() {
        let err = parse_harness_stdout("|Tasks|Version|\n|gsm8k|3|\n").unwrap_err();
        assert!(matches!(err, GateError::MalformedResults(_)));
    }

    #[test]
    fn empty_command_line_is_rejected() {
        assert!(CommandHarness::from_command_line("   ", 0).is_err());
    }

    #[test]
    fn command_line_is_split_on_whitespace() {
        let harness = CommandHarness::from_command_line("python3  driver.py --verbose", 30).unwrap();
        assert_eq!(harness.command(), ["python3", "driver.py", "--verbose"]);
        assert_eq!(harness.name(), "python3");
    }

    #[test]
    fn default_runs_embedded_driver() {
        let harness = CommandHarness::default();
        assert_eq!(harness.command()[0], "python3");
        assert_eq!(harness.command()[1], "-c");
        assert!(harness.command()[2].contains("simple_evaluate"));
    }

    #[test]
    fn tail_respects_char_boundaries() {
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("abcdef", 3), "def");
        let s = "ééé";
        let t = tail(s, 3);
        assert!(s.ends_with(t));
    }
}
