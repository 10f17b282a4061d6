//! Smoke probe against the completions endpoint.
//!
//! Sends one fixed prompt before the benchmark starts so an unreachable or
//! misbehaving service fails fast with a clear error instead of deep inside
//! the harness. No retries.

use evalgate_core::{obs, GateError, Result, RunConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::debug;

/// Fixed smoke prompt.
pub const SIMPLE_PROMPT: &str = "The best part about working on vLLM is that I got to meet so many \
people across various different organizations like UCB, Google, and Meta which means";

/// Local OpenAI-compatible services accept any key.
pub const DEFAULT_API_KEY: &str = "EMPTY";

const SEPARATOR_WIDTH: usize = 50;

/// Body of `POST /completions`.
///
/// The prompt is sent as a one-element list, which the protocol treats as a
/// batch of one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: Vec<String>,
}

/// OpenAI-compatible completion object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionChoice {
    #[serde(default)]
    pub index: u32,
    pub text: String,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Outcome of a successful probe.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub status: u16,
    pub latency_ms: u64,
    /// Raw response body as returned by the service.
    pub body: Value,
    pub completion: CompletionResponse,
}

impl ProbeResult {
    /// Text of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.completion.choices.first().map(|c| c.text.as_str())
    }
}

/// Minimal client for the completions route.
pub struct CompletionsClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl CompletionsClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("evalgate/{}", evalgate_core::VERSION))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GateError::Connectivity(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    pub fn from_config(config: &RunConfig, api_key: &str) -> Result<Self> {
        Self::new(&config.base_url, api_key, config.timeout_secs)
    }

    pub fn completions_url(&self) -> String {
        format!("{}/completions", self.base_url)
    }

    /// Issue one completion request with default generation parameters.
    ///
    /// Connection failures, non-2xx statuses and bodies that are not a
    /// completion object are all returned as errors.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<ProbeResult> {
        let url = self.completions_url();
        let request = CompletionRequest {
            model: model.to_string(),
            prompt: vec![prompt.to_string()],
        };

        let start = Instant::now();
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GateError::Connectivity(format!("POST {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GateError::HttpStatus {
                status: status.as_u16(),
                url,
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GateError::Connectivity(format!("reading body from {}: {}", url, e)))?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| GateError::MalformedResponse(format!("body is not JSON: {}", e)))?;
        let completion: CompletionResponse = serde_json::from_value(body.clone())
            .map_err(|e| GateError::MalformedResponse(e.to_string()))?;
        if completion.choices.is_empty() {
            return Err(GateError::MalformedResponse(
                "completion has no choices".into(),
            ));
        }

        debug!(choices = completion.choices.len(), "completion received");
        obs::emit_probe_completed(&url, status.as_u16(), latency_ms);

        Ok(ProbeResult {
            status: status.as_u16(),
            latency_ms,
            body,
            completion,
        })
    }
}

/// Framed, human-readable dump of a probe response.
pub fn render_probe_output(model: &str, result: &ProbeResult) -> Result<String> {
    let body = serde_json::to_string_pretty(&result.body)?;
    let sep = "-".repeat(SEPARATOR_WIDTH);
    Ok(format!(
        "{sep}\nCompletion results for {model}:\n{body}\n{sep}\n"
    ))
}

/// Send [`SIMPLE_PROMPT`] and write the framed response to `out`.
pub async fn run_probe(
    client: &CompletionsClient,
    model: &str,
    out: &mut (dyn Write + Send),
) -> Result<ProbeResult> {
    let result = client.complete(model, SIMPLE_PROMPT).await?;
    out.write_all(render_probe_output(model, &result)?.as_bytes())?;
    out.flush()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wraps_prompt_in_single_element_list() {
        let request = CompletionRequest {
            model: "Qwen/Qwen3-0.6B".to_string(),
            prompt: vec![SIMPLE_PROMPT.to_string()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "Qwen/Qwen3-0.6B");
        assert_eq!(json["prompt"].as_array().unwrap().len(), 1);
        assert!(json["prompt"][0]
            .as_str()
            .unwrap()
            .ends_with("Meta which means"));
    }

    #[test]
    fn response_parses_minimal_completion() {
        let completion: CompletionResponse = serde_json::from_value(json!({
            "choices": [{ "text": " we shared ideas." }]
        }))
        .unwrap();
        assert_eq!(completion.choices[0].text, " we shared ideas.");
        assert!(completion.usage.is_none());
    }

    #[test]
    fn response_without_choices_does_not_parse() {
        let parsed: std::result::Result<CompletionResponse, _> =
            serde_json::from_value(json!({ "error": "bad" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn rendered_output_is_framed() {
        let body = json!({ "id": "cmpl-1", "choices": [{ "text": "hi", "index": 0 }] });
        let result = ProbeResult {
            status: 200,
            latency_ms: 3,
            completion: serde_json::from_value(body.clone()).unwrap(),
            body,
        };
        let out = render_probe_output("m", &result).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let sep = "-".repeat(50);
        assert_eq!(lines[0], sep);
        assert_eq!(lines[1], "Completion results for m:");
        assert_eq!(*lines.last().unwrap(), sep);
        assert!(out.contains("cmpl-1"));
        assert_eq!(result.text(), Some("hi"));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = CompletionsClient::new("http://localhost:8192/v1/", "EMPTY", 5).unwrap();
        assert_eq!(
            client.completions_url(),
            "http://localhost:8192/v1/completions"
        );
    }
}
