// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single send-attempt primitive every retry discipline funnels through.

use std::time::Duration;

use courier_core::types::{CreatedItem, StatusClass, classify_status};
use courier_core::{ContentItem, CourierError, Transport};
use tracing::debug;

/// Create-post endpoint of the retrying strategy.
pub const RETRY_PATH: &str = "/level2/tweets";

/// Request header carrying the per-submission idempotency token.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// How one request ended.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(ContentItem),
    /// Worth retrying. `retry_after` is the server's `Retry-After`, if sent.
    Transient {
        error: CourierError,
        retry_after: Option<Duration>,
    },
    Terminal(CourierError),
}

/// Sends one create request and classifies the result.
///
/// 2xx (including a 200 idempotent replay) is success; 5xx, 429 and
/// connectivity or timeout failures are transient; anything else is terminal.
pub async fn send_attempt(
    transport: &dyn Transport,
    text: &str,
    idempotency_key: Option<&str>,
) -> AttemptOutcome {
    let body = serde_json::json!({ "text": text });
    let headers: Vec<(String, String)> = idempotency_key
        .map(|key| vec![(IDEMPOTENCY_HEADER.to_string(), key.to_string())])
        .unwrap_or_default();

    let response = match transport.post_json_raw(RETRY_PATH, &body, &headers).await {
        Ok(response) => response,
        Err(error) if error.is_transient() => {
            return AttemptOutcome::Transient {
                error,
                retry_after: None,
            };
        }
        Err(error) => return AttemptOutcome::Terminal(error),
    };

    debug!(status = response.status, "attempt response");
    match classify_status(response.status) {
        StatusClass::Success => match response.json::<CreatedItem>() {
            Ok(created) => AttemptOutcome::Success(created.tweet),
            Err(error) => AttemptOutcome::Terminal(error),
        },
        StatusClass::Transient => {
            let retry_after = response.header("retry-after").and_then(parse_retry_after);
            AttemptOutcome::Transient {
                error: CourierError::Http {
                    status: response.status,
                    body: response.text(),
                },
                retry_after,
            }
        }
        StatusClass::Terminal => AttemptOutcome::Terminal(CourierError::Http {
            status: response.status,
            body: response.text(),
        }),
    }
}

/// Parses a delta-seconds `Retry-After` value. HTTP-date values are ignored.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
