// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the delivery engines and their adapters.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CourierError;

/// A post accepted by the remote service. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Server-assigned identifier.
    pub id: String,
    pub text: String,
    /// Tag of the strategy that delivered it (e.g. "level2").
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub created_at: String,
}

/// `GET /tweets` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct Timeline {
    pub tweets: Vec<ContentItem>,
}

/// Response body of every endpoint that creates a post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedItem {
    pub tweet: ContentItem,
}

/// The four delivery strategies, one per presentation tab.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Single attempt, failures swallowed.
    Level1,
    /// Foreground retry disciplines.
    Level2,
    /// Resumable chunked transfer.
    Level3,
    /// Durable job queue.
    Level4,
}

/// Foreground retry disciplines offered by the retry engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RetryDiscipline {
    ExponentialBackoff,
    CircuitBreaker,
    ManualRetry,
    Idempotent,
}

/// How an HTTP status code should be treated by a retrying caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Transient,
    Terminal,
}

/// 2xx succeeds; 5xx and 429 are worth retrying; everything else is final.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 | 500..=599 => StatusClass::Transient,
        _ => StatusClass::Terminal,
    }
}

/// A raw HTTP response, returned without status enforcement.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header pairs with lowercased names.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns the first value of the header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        classify_status(self.status) == StatusClass::Success
    }

    /// Lossy UTF-8 view of the body, for error messages.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CourierError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Converts a non-2xx response into [`CourierError::Http`].
    pub fn error_for_status(self) -> Result<Self, CourierError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CourierError::Http {
                status: self.status,
                body: self.text(),
            })
        }
    }
}

/// Callback receiving `(bytes_sent, bytes_expected)` during an upload.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// One resumable chunked transfer, owned by the manager driving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSession {
    /// Server-assigned session identifier.
    pub id: String,
    pub total_bytes: u64,
    /// Next byte the client believes the server still needs.
    pub next_offset: u64,
    pub complete: bool,
}

impl TransferSession {
    pub fn new(id: String, total_bytes: u64, next_offset: u64) -> Self {
        Self {
            id,
            total_bytes,
            next_offset,
            complete: false,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.total_bytes.saturating_sub(self.next_offset)
    }

    /// Moves the offset forward; never moves it backward or past the end.
    pub fn advance_to(&mut self, offset: u64) {
        self.next_offset = self.next_offset.max(offset.min(self.total_bytes));
    }
}

/// Lifecycle state of a persisted delivery job. Success removes the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Uploading,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Uploading => "uploading",
            JobState::Failed => "failed",
        }
    }
}

/// The durable unit of work of the job queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryJob {
    /// Locally generated identifier (UUID v4).
    pub id: String,
    pub text: String,
    pub state: JobState,
    pub attempts: u32,
    pub last_error: Option<String>,
    /// ISO 8601 timestamp.
    pub created_at: String,
    /// ISO 8601 timestamp.
    pub updated_at: String,
}

/// A submission handed to a delivery strategy by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub text: String,
    /// Local media file (required by the resumable strategy, ignored by the others).
    pub media: Option<PathBuf>,
    /// Retry discipline override for the retrying strategy.
    pub discipline: Option<RetryDiscipline>,
}

impl SubmitRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_media(mut self, path: impl Into<PathBuf>) -> Self {
        self.media = Some(path.into());
        self
    }

    pub fn with_discipline(mut self, discipline: RetryDiscipline) -> Self {
        self.discipline = Some(discipline);
        self
    }
}

/// What a strategy did with a submission that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The remote service accepted the post.
    Delivered(ContentItem),
    /// The single-attempt strategy gave up silently.
    Dropped,
    /// The post was persisted for background delivery.
    Queued { job_id: String },
}

/// The three outcomes the presentation layer distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOutcome {
    Success,
    /// Dismissible error.
    Error { message: String },
    /// "Would you like to retry?" carrying the original text.
    RetryPrompt { payload: String },
}

impl UserOutcome {
    pub fn from_result(result: &Result<Submission, CourierError>) -> Self {
        match result {
            Ok(_) => UserOutcome::Success,
            Err(CourierError::ManualRetryRequested { payload, .. }) => UserOutcome::RetryPrompt {
                payload: payload.clone(),
            },
            Err(e) => UserOutcome::Error {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_outcome_folds_submission_results() {
        let delivered: Result<Submission, CourierError> = Ok(Submission::Dropped);
        assert_eq!(UserOutcome::from_result(&delivered), UserOutcome::Success);

        let manual: Result<Submission, CourierError> = Err(CourierError::ManualRetryRequested {
            payload: "hello".into(),
            reason: "remote service returned 503: ".into(),
        });
        assert_eq!(
            UserOutcome::from_result(&manual),
            UserOutcome::RetryPrompt {
                payload: "hello".into()
            }
        );

        let terminal: Result<Submission, CourierError> =
            Err(CourierError::Terminal("gave up after 5 attempts".into()));
        assert_eq!(
            UserOutcome::from_result(&terminal),
            UserOutcome::Error {
                message: "gave up after 5 attempts".into()
            }
        );
    }

    #[test]
    fn classify_status_boundaries() {
        assert_eq!(classify_status(200), StatusClass::Success);
        assert_eq!(classify_status(204), StatusClass::Success);
        assert_eq!(classify_status(429), StatusClass::Transient);
        assert_eq!(classify_status(500), StatusClass::Transient);
        assert_eq!(classify_status(503), StatusClass::Transient);
        assert_eq!(classify_status(400), StatusClass::Terminal);
        assert_eq!(classify_status(404), StatusClass::Terminal);
        assert_eq!(classify_status(409), StatusClass::Terminal);
    }

    proptest::proptest! {
        #[test]
        fn classify_status_is_total(status in 100u16..1000) {
            let class = classify_status(status);
            let expected = if (200..300).contains(&status) {
                StatusClass::Success
            } else if status == 429 || (500..600).contains(&status) {
                StatusClass::Transient
            } else {
                StatusClass::Terminal
            };
            proptest::prop_assert_eq!(class, expected);
        }
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = HttpResponse {
            status: 204,
            headers: vec![("upload-offset".into(), "1024".into())],
            body: Vec::new(),
        };
        assert_eq!(response.header("Upload-Offset"), Some("1024"));
        assert!(response.header("Retry-After").is_none());
    }

    #[test]
    fn error_for_status_keeps_body() {
        let response = HttpResponse {
            status: 422,
            headers: Vec::new(),
            body: b"text too long".to_vec(),
        };
        let err = response.error_for_status().unwrap_err();
        assert!(matches!(err, CourierError::Http { status: 422, .. }));
        assert!(err.to_string().contains("text too long"));
    }

    #[test]
    fn content_item_parses_server_shape() {
        let body = r#"{"tweet":{"id":"t-1","text":"hi","level":"level2","createdAt":"2026-01-01T00:00:00Z"}}"#;
        let created: CreatedItem = serde_json::from_str(body).unwrap();
        assert_eq!(created.tweet.id, "t-1");
        assert_eq!(created.tweet.level, "level2");
        assert_eq!(created.tweet.created_at, "2026-01-01T00:00:00Z");
    }

    #[test]
    fn transfer_session_never_moves_backward() {
        let mut session = TransferSession::new("s".into(), 100, 40);
        session.advance_to(20);
        assert_eq!(session.next_offset, 40);
        session.advance_to(70);
        assert_eq!(session.next_offset, 70);
        session.advance_to(500);
        assert_eq!(session.next_offset, 100);
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn strategy_and_discipline_parse() {
        use std::str::FromStr;
        assert_eq!(StrategyKind::from_str("level3").unwrap(), StrategyKind::Level3);
        assert_eq!(StrategyKind::Level4.to_string(), "level4");
        assert_eq!(
            RetryDiscipline::from_str("circuit_breaker").unwrap(),
            RetryDiscipline::CircuitBreaker
        );
        assert_eq!(JobState::Uploading.to_string(), JobState::Uploading.as_str());
    }

    #[test]
    fn user_outcome_distinguishes_three_cases() {
        let ok: Result<Submission, CourierError> = Ok(Submission::Dropped);
        assert_eq!(UserOutcome::from_result(&ok), UserOutcome::Success);

        let manual: Result<Submission, CourierError> = Err(CourierError::ManualRetryRequested {
            payload: "hello".into(),
            reason: "503".into(),
        });
        assert_eq!(
            UserOutcome::from_result(&manual),
            UserOutcome::RetryPrompt {
                payload: "hello".into()
            }
        );

        let terminal: Result<Submission, CourierError> =
            Err(CourierError::Terminal("gave up".into()));
        assert!(matches!(
            UserOutcome::from_result(&terminal),
            UserOutcome::Error { .. }
        ));
    }
}
