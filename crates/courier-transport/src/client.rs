// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the remote content service.
//!
//! Provides [`HttpTransport`], the reqwest implementation of
//! [`Transport`]. It performs exactly one request per call; retrying is the
//! delivery engines' business.

use std::time::Duration;

use async_trait::async_trait;
use courier_config::ClientConfig;
use courier_core::{CourierError, Headers, HttpResponse, ProgressCallback, Transport};
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;

/// Size of the pieces a `PUT` body is streamed in; progress fires once per piece.
const UPLOAD_PIECE_SIZE: usize = 64 * 1024;

/// HTTP transport bound to one remote service base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CourierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CourierError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a transport from the `[client]` configuration section.
    pub fn from_config(config: &ClientConfig) -> Result<Self, CourierError> {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<HttpResponse, CourierError> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(network_error)?.to_vec();
        debug!(path, status, bytes = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Maps a reqwest failure that produced no response.
///
/// Connectivity, timeout and mid-request failures are retryable; anything
/// else (bad URL, redirect loop, body decode) is not.
fn network_error(e: reqwest::Error) -> CourierError {
    CourierError::Network {
        retryable: e.is_connect() || e.is_timeout() || e.is_request(),
        message: e.to_string(),
    }
}

fn header_map(headers: &Headers) -> Result<HeaderMap, CourierError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CourierError::Validation(format!("invalid header name `{name}`: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CourierError::Validation(format!("invalid header value: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<Value, CourierError> {
        debug!(path, "GET");
        let response = self
            .send(self.client.get(self.url(path)), path)
            .await?
            .error_for_status()?;
        response.json()
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, CourierError> {
        debug!(path, "POST");
        let response = self
            .send(self.client.post(self.url(path)).json(body), path)
            .await?
            .error_for_status()?;
        response.json()
    }

    async fn post_json_raw(
        &self,
        path: &str,
        body: &Value,
        headers: &Headers,
    ) -> Result<HttpResponse, CourierError> {
        debug!(path, "POST (raw)");
        let request = self
            .client
            .post(self.url(path))
            .headers(header_map(headers)?)
            .json(body);
        self.send(request, path).await
    }

    async fn put_bytes(
        &self,
        path: &str,
        body: Vec<u8>,
        headers: &Headers,
        progress: Option<ProgressCallback>,
    ) -> Result<HttpResponse, CourierError> {
        let total = body.len() as u64;
        debug!(path, bytes = total, "PUT");

        let pieces: Vec<Vec<u8>> = body
            .chunks(UPLOAD_PIECE_SIZE)
            .map(<[u8]>::to_vec)
            .collect();
        let mut sent = 0u64;
        let stream = futures::stream::iter(pieces).map(move |piece| {
            sent += piece.len() as u64;
            if let Some(progress) = &progress {
                progress(sent, total);
            }
            Ok::<_, std::io::Error>(piece)
        });

        let request = self
            .client
            .put(self.url(path))
            .headers(header_map(headers)?)
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream));
        self.send(request, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use wiremock::matchers::{body_bytes, body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn get_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tweets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tweets": [{"id": "t-1", "text": "hello", "level": "level1", "createdAt": "2026-01-01T00:00:00Z"}]
            })))
            .mount(&server)
            .await;

        let transport = test_transport(&server.uri());
        let items = courier_core::fetch_timeline(&transport).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "hello");
    }

    #[tokio::test]
    async fn post_json_enforces_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/level1/tweets"))
            .respond_with(ResponseTemplate::new(400).set_body_string("text required"))
            .mount(&server)
            .await;

        let transport = test_transport(&server.uri());
        let err = transport
            .post_json("/level1/tweets", &serde_json::json!({"text": ""}))
            .await
            .unwrap_err();
        assert!(
            matches!(err, CourierError::Http { status: 400, ref body } if body == "text required"),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn post_json_raw_returns_non_success_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/level2/tweets"))
            .and(header("idempotency-key", "key-1"))
            .and(body_json(serde_json::json!({"text": "hi"})))
            .respond_with(
                ResponseTemplate::new(503)
                    .insert_header("Retry-After", "2")
                    .set_body_string("busy"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = test_transport(&server.uri());
        let response = transport
            .post_json_raw(
                "/level2/tweets",
                &serde_json::json!({"text": "hi"}),
                &[("Idempotency-Key".to_string(), "key-1".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.header("retry-after"), Some("2"));
        assert_eq!(response.text(), "busy");
    }

    #[tokio::test]
    async fn put_bytes_streams_body_and_reports_progress() {
        let server = MockServer::start().await;
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        Mock::given(method("PUT"))
            .and(path("/level3/uploads/s-1/chunk"))
            .and(header("upload-offset", "0"))
            .and(header("upload-length", "200000"))
            .and(body_bytes(payload.clone()))
            .respond_with(ResponseTemplate::new(204).insert_header("Upload-Offset", "200000"))
            .expect(1)
            .mount(&server)
            .await;

        let seen = Arc::new(AtomicU64::new(0));
        let seen_cb = seen.clone();
        let progress: ProgressCallback = Arc::new(move |sent, total| {
            assert_eq!(total, 200_000);
            seen_cb.fetch_max(sent, Ordering::SeqCst);
        });

        let transport = test_transport(&server.uri());
        let response = transport
            .put_bytes(
                "/level3/uploads/s-1/chunk",
                payload,
                &[
                    ("Upload-Offset".to_string(), "0".to_string()),
                    ("Upload-Length".to_string(), "200000".to_string()),
                ],
                Some(progress),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 204);
        assert_eq!(response.header("Upload-Offset"), Some("200000"));
        assert_eq!(seen.load(Ordering::SeqCst), 200_000);
    }

    #[tokio::test]
    async fn connection_refused_is_retryable_network_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = test_transport(&format!("http://127.0.0.1:{port}"));
        let err = transport.get_json("/tweets").await.unwrap_err();
        assert!(
            matches!(err, CourierError::Network { retryable: true, .. }),
            "got: {err:?}"
        );
        assert!(err.is_transient());
    }

    #[test]
    fn url_joins_with_and_without_slash() {
        let transport = test_transport("http://localhost:8080/");
        assert_eq!(transport.base_url(), "http://localhost:8080");
        assert_eq!(transport.url("/tweets"), "http://localhost:8080/tweets");
        assert_eq!(transport.url("tweets"), "http://localhost:8080/tweets");
    }
}
