// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport client trait: the thin HTTP request/response capability every
//! engine sends through.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CourierError;
use crate::types::{ContentItem, HttpResponse, ProgressCallback, Timeline};

/// Extra request headers as `(name, value)` pairs.
pub type Headers = [(String, String)];

/// HTTP capability consumed by the delivery engines.
///
/// Paths are relative to the remote service's base URL (e.g. `/tweets`).
/// Failures that never produced a response surface as
/// [`CourierError::Network`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// `GET` a JSON document, enforcing a 2xx status.
    async fn get_json(&self, path: &str) -> Result<Value, CourierError>;

    /// `POST` a JSON body and decode the JSON reply, enforcing a 2xx status.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, CourierError>;

    /// `POST` a JSON body and return the raw response without status enforcement.
    async fn post_json_raw(
        &self,
        path: &str,
        body: &Value,
        headers: &Headers,
    ) -> Result<HttpResponse, CourierError>;

    /// `PUT` raw bytes and return the raw response without status enforcement.
    ///
    /// `progress` is invoked with `(sent, total)` as the body is consumed.
    async fn put_bytes(
        &self,
        path: &str,
        body: Vec<u8>,
        headers: &Headers,
        progress: Option<ProgressCallback>,
    ) -> Result<HttpResponse, CourierError>;
}

/// Fetches the current content list (`GET /tweets`).
pub async fn fetch_timeline(transport: &dyn Transport) -> Result<Vec<ContentItem>, CourierError> {
    let value = transport.get_json("/tweets").await?;
    let timeline: Timeline = serde_json::from_value(value)?;
    Ok(timeline.tweets)
}
