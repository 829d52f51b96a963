// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted transport for deterministic engine tests.
//!
//! Replies are queued per `(method, path)` and popped in order. Once a queue
//! is empty the route's fallback reply (if any) repeats; unknown routes answer
//! 404. Every call is recorded with the tokio clock reading at send time.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{CourierError, Headers, HttpResponse, ProgressCallback, Transport};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with this response.
    Response(HttpResponse),
    /// Fail before any response, like a refused connection or a timeout.
    Network { retryable: bool },
}

impl MockReply {
    /// Empty-bodied response with `status`.
    pub fn status(status: u16) -> Self {
        MockReply::Response(HttpResponse {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        })
    }

    /// JSON-bodied response.
    pub fn json(status: u16, body: Value) -> Self {
        MockReply::Response(HttpResponse {
            status,
            headers: vec![("content-type".into(), "application/json".into())],
            body: body.to_string().into_bytes(),
        })
    }

    /// Adds a response header. No effect on network failures.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let MockReply::Response(response) = &mut self {
            response
                .headers
                .push((name.to_ascii_lowercase(), value.to_string()));
        }
        self
    }

    pub fn network() -> Self {
        MockReply::Network { retryable: true }
    }
}

/// Body of a successful create-post reply: `{"tweet": {...}}`.
pub fn created_tweet(id: &str, text: &str, level: &str) -> Value {
    serde_json::json!({
        "tweet": {
            "id": id,
            "text": text,
            "level": level,
            "createdAt": "2026-01-01T00:00:00.000Z",
        }
    })
}

/// A request the transport received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    /// Request headers with lowercased names.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub at: Instant,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parses the body as JSON; `Value::Null` if it is not.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

type Route = (String, String);

#[derive(Default)]
struct Script {
    queued: HashMap<Route, VecDeque<MockReply>>,
    fallback: HashMap<Route, MockReply>,
}

/// In-memory [`Transport`] with scripted replies.
#[derive(Default, Clone)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `replies` for `method path`, after any already queued.
    pub async fn script(
        &self,
        method: &str,
        path: &str,
        replies: impl IntoIterator<Item = MockReply>,
    ) {
        self.script
            .lock()
            .await
            .queued
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .extend(replies);
    }

    /// Sets the reply used once the queue for `method path` is empty.
    pub async fn otherwise(&self, method: &str, path: &str, reply: MockReply) {
        self.script
            .lock()
            .await
            .fallback
            .insert((method.to_string(), path.to_string()), reply);
    }

    /// All recorded calls, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Recorded calls to `method path`, in order.
    pub async fn calls_to(&self, method: &str, path: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .cloned()
            .collect()
    }

    pub async fn call_count(&self, method: &str, path: &str) -> usize {
        self.calls_to(method, path).await.len()
    }

    async fn respond(
        &self,
        method: &str,
        path: &str,
        headers: &Headers,
        body: Vec<u8>,
    ) -> Result<HttpResponse, CourierError> {
        self.calls.lock().await.push(RecordedCall {
            method: method.to_string(),
            path: path.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            body,
            at: Instant::now(),
        });

        let route = (method.to_string(), path.to_string());
        let reply = {
            let mut script = self.script.lock().await;
            let queued = script.queued.get_mut(&route).and_then(VecDeque::pop_front);
            queued.or_else(|| script.fallback.get(&route).cloned())
        };
        tracing::debug!(method, path, "mock transport call");

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Network { retryable }) => Err(CourierError::Network {
                message: format!("scripted network failure for {method} {path}"),
                retryable,
            }),
            None => Ok(HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: format!("no scripted reply for {method} {path}").into_bytes(),
            }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(&self, path: &str) -> Result<Value, CourierError> {
        self.respond("GET", path, &[], Vec::new())
            .await?
            .error_for_status()?
            .json()
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, CourierError> {
        self.respond("POST", path, &[], body.to_string().into_bytes())
            .await?
            .error_for_status()?
            .json()
    }

    async fn post_json_raw(
        &self,
        path: &str,
        body: &Value,
        headers: &Headers,
    ) -> Result<HttpResponse, CourierError> {
        self.respond("POST", path, headers, body.to_string().into_bytes())
            .await
    }

    async fn put_bytes(
        &self,
        path: &str,
        body: Vec<u8>,
        headers: &Headers,
        progress: Option<ProgressCallback>,
    ) -> Result<HttpResponse, CourierError> {
        let total = body.len() as u64;
        let response = self.respond("PUT", path, headers, body).await?;
        if let Some(progress) = progress {
            progress(total, total);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_pop_in_order_then_fall_back() {
        let transport = MockTransport::new();
        transport
            .script(
                "POST",
                "/level2/tweets",
                [MockReply::status(503), MockReply::network()],
            )
            .await;
        transport
            .otherwise(
                "POST",
                "/level2/tweets",
                MockReply::json(201, created_tweet("t-1", "hi", "level2")),
            )
            .await;

        let body = serde_json::json!({"text": "hi"});
        let first = transport
            .post_json_raw("/level2/tweets", &body, &[])
            .await
            .unwrap();
        assert_eq!(first.status, 503);
        assert!(
            transport
                .post_json_raw("/level2/tweets", &body, &[])
                .await
                .unwrap_err()
                .is_transient()
        );
        for _ in 0..2 {
            let ok = transport
                .post_json_raw("/level2/tweets", &body, &[])
                .await
                .unwrap();
            assert_eq!(ok.status, 201);
        }
        assert_eq!(transport.call_count("POST", "/level2/tweets").await, 4);
    }

    #[tokio::test]
    async fn unknown_route_is_404_and_headers_are_recorded() {
        let transport = MockTransport::new();
        let response = transport
            .post_json_raw(
                "/nowhere",
                &serde_json::json!({}),
                &[("Idempotency-Key".to_string(), "abc".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(response.status, 404);

        let calls = transport.calls().await;
        assert_eq!(calls[0].header("idempotency-key"), Some("abc"));
        assert_eq!(calls[0].json(), serde_json::json!({}));
    }

    #[tokio::test]
    async fn get_json_enforces_status() {
        let transport = MockTransport::new();
        transport
            .script("GET", "/tweets", [MockReply::status(500)])
            .await;
        let err = transport.get_json("/tweets").await.unwrap_err();
        assert!(matches!(err, CourierError::Http { status: 500, .. }));
    }
}
