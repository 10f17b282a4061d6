//! In-process mock of an OpenAI-compatible completions service.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One request the mock received.
#[derive(Debug, Clone)]
pub struct Captured {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<Captured>>>,
}

pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Captured>>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().expect("lock").clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn completions_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .requests
        .lock()
        .expect("lock")
        .push(Captured {
            authorization,
            body,
        });
    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}

/// Serve `body` with `status` on `POST /v1/completions`.
pub async fn spawn_mock_completions(status: u16, body: &str) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let requests = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/v1/completions", post(completions_handler))
        .with_state(MockState {
            status: StatusCode::from_u16(status).expect("status"),
            body: body.to_string(),
            requests: requests.clone(),
        });

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockServer {
        base_url: format!("http://{}/v1", addr),
        requests,
        handle,
    }
}

/// A well-formed completion object.
pub fn completion_body() -> String {
    json!({
        "id": "cmpl-test",
        "object": "text_completion",
        "model": "Qwen/Qwen3-0.6B",
        "choices": [{
            "index": 0,
            "text": " I learned a lot from every one of them.",
            "finish_reason": "length"
        }],
        "usage": { "prompt_tokens": 31, "completion_tokens": 16, "total_tokens": 47 }
    })
    .to_string()
}

/// An address nothing listens on.
pub async fn unused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}/v1", addr)
}
