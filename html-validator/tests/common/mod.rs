//! A local stand-in for the Nu checker, plus an in-process scripted checker.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use html_validator::{Checker, CheckerError, CheckerOptions, FileRecord};
use serde_json::{Value, json};
use tokio::sync::Notify;

pub const VALID_HTML: &str = "<!doctype html>\n<html lang=en>\n<head><title>Valid</title></head>\n<body>\n<h1>Hello</h1>\n</body>\n</html>\n";

pub const INVALID_HTML: &str = "<!doctype html>\n<html lang=en>\n<head><title>Invalid</title></head>\n<body>\n<h1>Hello\n</body>\n</html>\n";

/// Messages a Nu checker produces for [`INVALID_HTML`].
pub fn unclosed_h1_messages() -> Vec<Value> {
    vec![
        json!({
            "type": "error",
            "lastLine": 6,
            "lastColumn": 7,
            "firstColumn": 1,
            "message": "End tag for  \u{201c}body\u{201d} seen, but there were unclosed elements.",
            "extract": "Hello\n</body>\n</ht",
            "hiliteStart": 6,
            "hiliteLength": 7
        }),
        json!({
            "type": "error",
            "lastLine": 5,
            "lastColumn": 4,
            "firstColumn": 1,
            "message": "Unclosed element \u{201c}h1\u{201d}.",
            "extract": "dy>\n<h1>Hello",
            "hiliteStart": 4,
            "hiliteLength": 4
        }),
    ]
}

pub fn trailing_slash_info() -> Value {
    json!({
        "type": "info",
        "lastLine": 3,
        "lastColumn": 30,
        "message": "Trailing slash on void elements has no effect and interacts badly with unquoted attribute values."
    })
}

/// Stand-in checker rules: an `<h1>` without `</h1>` produces the two
/// errors above; a `<br/>` produces an info message.
pub fn judge(document: &str) -> Vec<Value> {
    let mut messages = Vec::new();
    if document.contains("<br/>") {
        messages.push(trailing_slash_info());
    }
    if document.contains("<h1>") && !document.contains("</h1>") {
        messages.extend(unclosed_h1_messages());
    }
    if document.contains("<legacy-warning>") {
        messages.push(json!({ "type": "info", "subType": "warning", "message": "Legacy element." }));
    }
    messages
}

/// Shared state of a local checker server.
#[derive(Default)]
pub struct ServerState {
    /// Tag stamped on every message as `server`.
    pub name: String,
    /// Delay before answering.
    pub delay: Duration,
    /// Notified when a request arrives.
    pub received: Notify,
    /// Number of requests handled.
    pub requests: AtomicUsize,
    /// Content types seen, in arrival order.
    pub content_types: std::sync::Mutex<Vec<String>>,
}

async fn nu(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    state.received.notify_one();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    state.content_types.lock().unwrap().push(content_type);

    if params.get("out").map(String::as_str) != Some("json") {
        return (StatusCode::BAD_REQUEST, "out=json required").into_response();
    }
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let messages: Vec<Value> = judge(&body)
        .into_iter()
        .map(|mut m| {
            m["server"] = Value::String(state.name.clone());
            m
        })
        .collect();
    Json(json!({ "messages": messages })).into_response()
}

async fn unavailable() -> Response {
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

async fn garbage() -> Response {
    (StatusCode::OK, "<html>not json</html>").into_response()
}

/// Start a local checker; returns `(nu endpoint, base url, state)`.
pub async fn spawn_checker(name: &str, delay: Duration) -> (String, String, Arc<ServerState>) {
    let state = Arc::new(ServerState {
        name: name.to_owned(),
        delay,
        ..ServerState::default()
    });
    let app = Router::new()
        .route("/nu/", post(nu))
        .route("/down/", post(unavailable))
        .route("/garbage/", post(garbage))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base = format!("http://{addr}");
    (format!("{base}/nu/"), base, state)
}

/// In-process checker applying [`judge`] after a per-document delay, while
/// tracking how many calls are in flight at once.
#[derive(Default)]
pub struct ScriptedChecker {
    pub delays: HashMap<String, Duration>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: std::sync::Mutex<Vec<String>>,
}

impl ScriptedChecker {
    pub fn with_delays(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(doc, ms)| ((*doc).to_owned(), Duration::from_millis(*ms)))
                .collect(),
            ..Self::default()
        }
    }
}

impl Checker for ScriptedChecker {
    async fn check(
        &self,
        content: &[u8],
        _endpoint: &str,
        _options: &CheckerOptions,
    ) -> Result<Value, CheckerError> {
        let document = String::from_utf8_lossy(content).into_owned();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(document.clone());

        if let Some(delay) = self.delays.get(&document) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(json!({ "messages": judge(&document) }))
    }
}

pub fn html_record(name: &str, document: &str) -> FileRecord {
    FileRecord::new(
        format!("site/html/{name}"),
        "site/html/",
        document.as_bytes().to_vec(),
    )
}
