// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry policy engine: four foreground disciplines over one attempt primitive.
//!
//! Progress is the fraction of the discipline's attempt cap consumed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_config::RetryConfig;
use courier_core::{
    ContentItem, CourierError, DeliveryPhase, DeliveryStatus, DeliveryStrategy, RetryDiscipline,
    StatusReporter, StrategyKind, SubmitRequest, Submission, Transport, fetch_timeline,
};
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::attempt::{AttemptOutcome, send_attempt};
use crate::backoff::{exponential_delay, linear_delay};
use crate::circuit::CircuitBreaker;

/// Result of one bounded retry sequence.
enum Sequence {
    Delivered(ContentItem),
    /// A terminal failure stopped the sequence early.
    Aborted(CourierError),
    /// Every attempt failed transiently.
    Exhausted(CourierError),
}

/// Foreground retrying delivery.
///
/// Submissions are serialized: one runs at a time per engine instance.
pub struct RetryEngine {
    transport: Arc<dyn Transport>,
    config: RetryConfig,
    breaker: Mutex<CircuitBreaker>,
    in_flight: Mutex<()>,
    status: StatusReporter,
}

impl RetryEngine {
    pub fn new(transport: Arc<dyn Transport>, config: RetryConfig) -> Self {
        let breaker = CircuitBreaker::new(
            config.circuit_failure_threshold,
            config.circuit_cooldown(),
        );
        Self {
            transport,
            config,
            breaker: Mutex::new(breaker),
            in_flight: Mutex::new(()),
            status: StatusReporter::new(),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Whether the circuit breaker is currently open.
    pub async fn circuit_open(&self) -> bool {
        self.breaker.lock().await.is_open(Instant::now())
    }

    /// Submits `text` under `discipline`.
    pub async fn submit_with(
        &self,
        text: &str,
        discipline: RetryDiscipline,
    ) -> Result<Submission, CourierError> {
        if text.trim().is_empty() {
            return Err(CourierError::Validation("post text must not be empty".into()));
        }

        let _guard = self.in_flight.lock().await;
        self.status
            .begin(DeliveryPhase::Sending, format!("{discipline}"));

        let result = match discipline {
            RetryDiscipline::ExponentialBackoff => self.exponential_backoff(text).await,
            RetryDiscipline::CircuitBreaker => self.circuit_breaker(text).await,
            RetryDiscipline::ManualRetry => self.manual_retry(text).await,
            RetryDiscipline::Idempotent => self.idempotent(text).await,
        };

        match &result {
            Ok(item) => {
                info!(id = %item.id, %discipline, "delivered");
                self.status.finish(DeliveryPhase::Delivered, "delivered");
            }
            Err(e) => {
                warn!(error = %e, %discipline, "delivery failed");
                self.status.finish(DeliveryPhase::Failed, e.to_string());
            }
        }
        result.map(Submission::Delivered)
    }

    /// Runs up to `max_attempts`, sleeping `delay(attempt, retry_after)`
    /// between transient failures.
    async fn run_sequence(
        &self,
        text: &str,
        idempotency_key: Option<&str>,
        max_attempts: u32,
        delay: impl Fn(u32, Option<Duration>) -> Duration,
    ) -> Sequence {
        let max_attempts = max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            self.status.phase(
                DeliveryPhase::Sending,
                format!("attempt {attempt}/{max_attempts}"),
            );
            let outcome = send_attempt(self.transport.as_ref(), text, idempotency_key).await;
            self.status
                .progress(f64::from(attempt) / f64::from(max_attempts));

            match outcome {
                AttemptOutcome::Success(item) => return Sequence::Delivered(item),
                AttemptOutcome::Terminal(error) => {
                    debug!(attempt, error = %error, "terminal failure");
                    return Sequence::Aborted(error);
                }
                AttemptOutcome::Transient { error, retry_after } => {
                    warn!(attempt, max_attempts, error = %error, "transient failure");
                    if attempt < max_attempts {
                        let wait = delay(attempt, retry_after);
                        self.status.phase(
                            DeliveryPhase::Backoff,
                            format!("retrying in {}ms", wait.as_millis()),
                        );
                        debug!(attempt, delay_ms = wait.as_millis() as u64, "backing off");
                        sleep(wait).await;
                    }
                    last_error = Some(error);
                }
            }
        }

        Sequence::Exhausted(
            last_error.unwrap_or_else(|| CourierError::Internal("no attempt was made".into())),
        )
    }

    async fn exponential_backoff(&self, text: &str) -> Result<ContentItem, CourierError> {
        let max = self.config.backoff_max_attempts;
        let cap = Duration::from_secs(self.config.backoff_cap_secs);
        let sequence = self
            .run_sequence(text, None, max, |attempt, retry_after| {
                retry_after.unwrap_or_else(|| exponential_delay(attempt, cap))
            })
            .await;
        finish_sequence(sequence, max)
    }

    async fn circuit_breaker(&self, text: &str) -> Result<ContentItem, CourierError> {
        if let Err(remaining) = self.breaker.lock().await.check(Instant::now()) {
            debug!(remaining_ms = remaining.as_millis() as u64, "circuit open; not sending");
            return Err(CourierError::CircuitOpen { remaining });
        }

        let max = self.config.circuit_max_attempts;
        let pause = self.config.circuit_retry_delay();
        let sequence = self.run_sequence(text, None, max, |_, _| pause).await;

        match &sequence {
            Sequence::Delivered(_) => self.breaker.lock().await.record_success(),
            Sequence::Exhausted(_) => {
                self.breaker.lock().await.record_exhausted(Instant::now());
            }
            // Terminal failures say nothing about service health.
            Sequence::Aborted(_) => {}
        }
        finish_sequence(sequence, max)
    }

    async fn manual_retry(&self, text: &str) -> Result<ContentItem, CourierError> {
        match send_attempt(self.transport.as_ref(), text, None).await {
            AttemptOutcome::Success(item) => {
                self.status.progress(1.0);
                Ok(item)
            }
            AttemptOutcome::Transient { error, .. } | AttemptOutcome::Terminal(error) => {
                self.status.progress(1.0);
                Err(CourierError::ManualRetryRequested {
                    payload: text.to_string(),
                    reason: error.to_string(),
                })
            }
        }
    }

    async fn idempotent(&self, text: &str) -> Result<ContentItem, CourierError> {
        let key = uuid::Uuid::new_v4().to_string();
        debug!(idempotency_key = %key, "generated idempotency token");
        let max = self.config.idempotent_max_attempts;
        let sequence = self
            .run_sequence(text, Some(&key), max, |attempt, _| {
                linear_delay(attempt, Duration::from_secs(1))
            })
            .await;
        finish_sequence(sequence, max)
    }
}

fn finish_sequence(sequence: Sequence, max_attempts: u32) -> Result<ContentItem, CourierError> {
    match sequence {
        Sequence::Delivered(item) => Ok(item),
        Sequence::Aborted(error) => Err(error),
        Sequence::Exhausted(last) => Err(CourierError::Terminal(format!(
            "gave up after {max_attempts} attempts: {last}"
        ))),
    }
}

#[async_trait]
impl DeliveryStrategy for RetryEngine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Level2
    }

    async fn fetch(&self) -> Result<Vec<ContentItem>, CourierError> {
        fetch_timeline(self.transport.as_ref()).await
    }

    async fn submit(&self, request: SubmitRequest) -> Result<Submission, CourierError> {
        let discipline = request
            .discipline
            .unwrap_or(self.config.default_discipline);
        self.submit_with(&request.text, discipline).await
    }

    fn status(&self) -> DeliveryStatus {
        self.status.snapshot()
    }

    fn subscribe(&self) -> watch::Receiver<DeliveryStatus> {
        self.status.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::{IDEMPOTENCY_HEADER, RETRY_PATH};
    use courier_core::ErrorKind;
    use courier_test_utils::{MockReply, MockTransport, RecordedCall, created_tweet};

    fn engine(transport: &MockTransport) -> RetryEngine {
        RetryEngine::new(Arc::new(transport.clone()), RetryConfig::default())
    }

    fn ok_reply() -> MockReply {
        MockReply::json(201, created_tweet("t-1", "hello", "level2"))
    }

    fn gaps(calls: &[RecordedCall]) -> Vec<Duration> {
        calls.windows(2).map(|w| w[1].at - w[0].at).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_makes_five_calls_with_growing_delays() {
        let transport = MockTransport::new();
        transport
            .otherwise("POST", RETRY_PATH, MockReply::status(503))
            .await;
        let engine = engine(&transport);

        let err = engine
            .submit_with("hello", RetryDiscipline::ExponentialBackoff)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Terminal);
        assert!(err.to_string().contains("5 attempts"), "got: {err}");

        let calls = transport.calls_to("POST", RETRY_PATH).await;
        assert_eq!(calls.len(), 5);
        assert_eq!(
            gaps(&calls),
            vec![1, 2, 4, 8]
                .into_iter()
                .map(Duration::from_secs)
                .collect::<Vec<_>>()
        );
        assert_eq!(engine.status().progress, 1.0);
        assert_eq!(engine.status().phase, DeliveryPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_honors_retry_after() {
        let transport = MockTransport::new();
        transport
            .script(
                "POST",
                RETRY_PATH,
                [
                    MockReply::status(503).with_header("Retry-After", "6"),
                    ok_reply(),
                ],
            )
            .await;
        let engine = engine(&transport);

        let outcome = engine
            .submit_with("hello", RetryDiscipline::ExponentialBackoff)
            .await
            .unwrap();
        assert!(matches!(outcome, Submission::Delivered(_)));
        let calls = transport.calls_to("POST", RETRY_PATH).await;
        assert_eq!(gaps(&calls), vec![Duration::from_secs(6)]);
        assert_eq!(engine.status().phase, DeliveryPhase::Delivered);
        assert_eq!(engine.status().progress, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failure_aborts_immediately() {
        let transport = MockTransport::new();
        transport
            .script("POST", RETRY_PATH, [MockReply::status(422)])
            .await;
        let engine = engine(&transport);

        let err = engine
            .submit_with("hello", RetryDiscipline::ExponentialBackoff)
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Http { status: 422, .. }));
        assert_eq!(transport.call_count("POST", RETRY_PATH).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn circuit_opens_after_two_exhausted_submissions() {
        let transport = MockTransport::new();
        transport
            .otherwise("POST", RETRY_PATH, MockReply::status(500))
            .await;
        let engine = engine(&transport);

        for _ in 0..2 {
            let err = engine
                .submit_with("hello", RetryDiscipline::CircuitBreaker)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("3 attempts"), "got: {err}");
        }
        let calls = transport.calls_to("POST", RETRY_PATH).await;
        assert_eq!(calls.len(), 6);
        assert_eq!(gaps(&calls[..3]), vec![Duration::from_millis(750); 2]);
        assert!(engine.circuit_open().await);

        // Open: fails immediately, no network call.
        tokio::time::advance(Duration::from_secs(3)).await;
        let err = engine
            .submit_with("hello", RetryDiscipline::CircuitBreaker)
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::CircuitOpen { .. }));
        assert!(err.to_string().contains("try again in"), "got: {err}");
        assert_eq!(transport.call_count("POST", RETRY_PATH).await, 6);

        // Window elapsed: network calls resume.
        tokio::time::advance(Duration::from_secs(15)).await;
        transport.script("POST", RETRY_PATH, [ok_reply()]).await;
        engine
            .submit_with("hello", RetryDiscipline::CircuitBreaker)
            .await
            .unwrap();
        assert_eq!(transport.call_count("POST", RETRY_PATH).await, 7);
        assert!(!engine.circuit_open().await);
    }

    #[tokio::test(start_paused = true)]
    async fn success_between_failures_keeps_circuit_closed() {
        let transport = MockTransport::new();
        let down = [
            MockReply::status(503),
            MockReply::status(503),
            MockReply::status(503),
        ];
        transport.script("POST", RETRY_PATH, down.clone()).await;
        transport.script("POST", RETRY_PATH, [ok_reply()]).await;
        transport.script("POST", RETRY_PATH, down).await;
        let engine = engine(&transport);

        assert!(
            engine
                .submit_with("a", RetryDiscipline::CircuitBreaker)
                .await
                .is_err()
        );
        assert!(
            engine
                .submit_with("b", RetryDiscipline::CircuitBreaker)
                .await
                .is_ok()
        );
        assert!(
            engine
                .submit_with("c", RetryDiscipline::CircuitBreaker)
                .await
                .is_err()
        );
        assert!(!engine.circuit_open().await);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failures_do_not_trip_the_circuit() {
        let transport = MockTransport::new();
        transport
            .otherwise("POST", RETRY_PATH, MockReply::status(400))
            .await;
        let engine = engine(&transport);

        for _ in 0..3 {
            let err = engine
                .submit_with("a", RetryDiscipline::CircuitBreaker)
                .await
                .unwrap_err();
            assert!(matches!(err, CourierError::Http { status: 400, .. }));
        }
        assert!(!engine.circuit_open().await);
        assert_eq!(transport.call_count("POST", RETRY_PATH).await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_retry_carries_payload() {
        let transport = MockTransport::new();
        transport
            .script(
                "POST",
                RETRY_PATH,
                [MockReply::status(503), MockReply::status(400)],
            )
            .await;
        let engine = engine(&transport);

        for _ in 0..2 {
            let err = engine
                .submit_with("keep me", RetryDiscipline::ManualRetry)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ManualRetryRequested);
            assert!(
                matches!(err, CourierError::ManualRetryRequested { ref payload, .. } if payload == "keep me")
            );
        }
        assert_eq!(transport.call_count("POST", RETRY_PATH).await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn idempotent_reuses_one_key_per_submission() {
        let transport = MockTransport::new();
        transport
            .script(
                "POST",
                RETRY_PATH,
                [
                    MockReply::status(503),
                    MockReply::network(),
                    MockReply::json(200, created_tweet("t-1", "hello", "level2")),
                ],
            )
            .await;
        transport.otherwise("POST", RETRY_PATH, ok_reply()).await;
        let engine = engine(&transport);

        engine
            .submit_with("hello", RetryDiscipline::Idempotent)
            .await
            .unwrap();
        engine
            .submit_with("hello", RetryDiscipline::Idempotent)
            .await
            .unwrap();

        let calls = transport.calls_to("POST", RETRY_PATH).await;
        assert_eq!(calls.len(), 4);
        let keys: Vec<&str> = calls
            .iter()
            .map(|c| c.header(IDEMPOTENCY_HEADER).unwrap())
            .collect();
        assert_eq!(keys[0], keys[1]);
        assert_eq!(keys[1], keys[2]);
        assert_ne!(keys[2], keys[3]);
        assert_eq!(
            gaps(&calls[..3]),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn idempotent_exhaustion_is_terminal() {
        let transport = MockTransport::new();
        transport
            .otherwise("POST", RETRY_PATH, MockReply::status(429))
            .await;
        let engine = engine(&transport);

        let err = engine
            .submit_with("hello", RetryDiscipline::Idempotent)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Terminal);
        assert_eq!(transport.call_count("POST", RETRY_PATH).await, 4);
    }

    #[tokio::test]
    async fn empty_text_is_a_validation_error() {
        let transport = MockTransport::new();
        let engine = engine(&transport);
        let err = engine
            .submit(SubmitRequest::new("   "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(transport.calls().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn facade_uses_configured_default_discipline() {
        let transport = MockTransport::new();
        transport
            .script("POST", RETRY_PATH, [MockReply::status(503)])
            .await;
        let config = RetryConfig {
            default_discipline: RetryDiscipline::ManualRetry,
            ..RetryConfig::default()
        };
        let engine = RetryEngine::new(Arc::new(transport.clone()), config);

        let err = engine.submit(SubmitRequest::new("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ManualRetryRequested);

        transport
            .script("POST", RETRY_PATH, [ok_reply()])
            .await;
        let ok = engine
            .submit(SubmitRequest::new("x").with_discipline(RetryDiscipline::ExponentialBackoff))
            .await
            .unwrap();
        assert!(matches!(ok, Submission::Delivered(_)));
    }
}
