// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resumable chunked uploads.
//!
//! `start -> chunk loop -> complete`. Every confirmed chunk is persisted to
//! the [`OffsetStore`] so a later run of the same session skips bytes the
//! server already holds.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use courier_config::ResumableConfig;
use courier_core::types::{CreatedItem, HttpResponse};
use courier_core::{
    ContentItem, CourierError, DeliveryPhase, DeliveryStatus, DeliveryStrategy, OffsetStore,
    ProgressCallback, StatusReporter, StrategyKind, SubmitRequest, Submission, TransferSession,
    Transport, fetch_timeline,
};
use serde::Deserialize;
use tokio::sync::{Mutex, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::bridge::{ChunkRequest, TransferBridge};
use crate::chunks::{Chunk, ChunkReader};

pub const START_PATH: &str = "/level3/uploads/start";
pub const UPLOAD_OFFSET_HEADER: &str = "Upload-Offset";
pub const UPLOAD_LENGTH_HEADER: &str = "Upload-Length";

/// Progress stays below this until the session is finalized.
const MAX_UNFINALIZED_PROGRESS: f64 = 0.99;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartedSession {
    session_id: String,
    #[serde(default)]
    next_offset: u64,
}

#[derive(Debug, Deserialize)]
struct RemoteSession {
    offset: u64,
}

fn session_path(session_id: &str) -> String {
    format!("/level3/uploads/{session_id}")
}

fn confirmed_fraction(confirmed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (confirmed as f64 / total as f64).min(MAX_UNFINALIZED_PROGRESS)
}

fn upload_offset(response: &HttpResponse) -> Option<u64> {
    response
        .header(UPLOAD_OFFSET_HEADER)
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Offset the server acknowledged for `chunk`, falling back to the chunk end.
fn acknowledged_offset(response: &HttpResponse, chunk: &Chunk) -> u64 {
    upload_offset(response).unwrap_or(0).max(chunk.end())
}

/// Uploads a post with a media payload through the resumable session API.
pub struct ResumableUploader {
    transport: Arc<dyn Transport>,
    bridge: Arc<TransferBridge>,
    offsets: Arc<dyn OffsetStore>,
    config: ResumableConfig,
    status: Arc<StatusReporter>,
    in_flight: Mutex<()>,
}

impl ResumableUploader {
    pub fn new(
        transport: Arc<dyn Transport>,
        bridge: Arc<TransferBridge>,
        offsets: Arc<dyn OffsetStore>,
        config: ResumableConfig,
    ) -> Self {
        Self {
            transport,
            bridge,
            offsets,
            config,
            status: Arc::new(StatusReporter::new()),
            in_flight: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ResumableConfig {
        &self.config
    }

    pub fn bridge(&self) -> &Arc<TransferBridge> {
        &self.bridge
    }

    /// Uploads `media` in chunks, then creates the post with `text`.
    pub async fn upload(&self, text: &str, media: &Path) -> Result<ContentItem, CourierError> {
        let _guard = self.in_flight.lock().await;
        self.status
            .begin(DeliveryPhase::Uploading, media.display().to_string());

        let result = self.run(text, media).await;
        match &result {
            Ok(item) => {
                info!(id = %item.id, "resumable upload delivered");
                self.status.finish(DeliveryPhase::Delivered, "delivered");
            }
            Err(e) => {
                error!(error = %e, "resumable upload failed");
                self.status.finish(DeliveryPhase::Failed, e.to_string());
            }
        }
        result
    }

    async fn run(&self, text: &str, media: &Path) -> Result<ContentItem, CourierError> {
        let mut reader = ChunkReader::open(media, self.config.chunk_size).await?;
        let filename = media
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        let mut session = self.start_session(text, &filename, reader.file_size()).await?;
        self.status.advance(confirmed_fraction(
            session.next_offset,
            session.total_bytes,
        ));

        while session.next_offset < session.total_bytes {
            self.deliver_chunk(&mut session, &mut reader).await?;
        }

        self.status.phase(DeliveryPhase::Finalizing, "completing session");
        let path = format!("{}/complete", session_path(&session.id));
        let created: CreatedItem = serde_json::from_value(
            self.transport
                .post_json(&path, &serde_json::json!({ "text": text }))
                .await?,
        )?;
        session.complete = true;

        if let Err(e) = self.offsets.clear(&session.id).await {
            warn!(session_id = %session.id, error = %e, "failed to clear stored offset");
        }
        self.bridge.discard_session(&session.id).await;
        Ok(created.tweet)
    }

    async fn start_session(
        &self,
        text: &str,
        filename: &str,
        total_bytes: u64,
    ) -> Result<TransferSession, CourierError> {
        let body = serde_json::json!({
            "text": text,
            "filename": filename,
            "totalBytes": total_bytes,
        });
        let started: StartedSession =
            serde_json::from_value(self.transport.post_json(START_PATH, &body).await?)?;

        let stored = match self.offsets.load(&started.session_id).await {
            Ok(stored) => stored.unwrap_or(0),
            Err(e) => {
                warn!(session_id = %started.session_id, error = %e, "failed to load stored offset");
                0
            }
        };

        let mut session = TransferSession::new(started.session_id, total_bytes, 0);
        session.advance_to(started.next_offset.max(stored));
        info!(
            session_id = %session.id,
            total_bytes,
            server_offset = started.next_offset,
            stored_offset = stored,
            offset = session.next_offset,
            "transfer session started"
        );
        Ok(session)
    }

    /// Gets the chunk at the current offset accepted, retrying it on failure.
    ///
    /// Returns early once the offset moves, whether by acknowledgement or by
    /// reconciling with the server.
    async fn deliver_chunk(
        &self,
        session: &mut TransferSession,
        reader: &mut ChunkReader,
    ) -> Result<(), CourierError> {
        let max_retries = self.config.max_chunk_retries;
        let mut retry = 0u32;

        loop {
            let Some(chunk) = reader.chunk_at(session.next_offset).await? else {
                return Ok(());
            };
            self.status.phase(
                DeliveryPhase::Uploading,
                format!("{}/{} bytes", chunk.offset, session.total_bytes),
            );

            let failure = match self.send_chunk(session, &chunk).await {
                Ok(acknowledged) => {
                    debug!(session_id = %session.id, offset = chunk.offset, acknowledged, "chunk accepted");
                    self.confirm(session, acknowledged).await;
                    return Ok(());
                }
                Err(e) => e,
            };

            if retry >= max_retries {
                return Err(CourierError::Terminal(format!(
                    "chunk at offset {} failed after {max_retries} retries: {failure}",
                    chunk.offset
                )));
            }
            retry += 1;

            let wait = self.config.chunk_retry_delay().saturating_mul(retry);
            warn!(
                session_id = %session.id,
                offset = chunk.offset,
                retry,
                delay_ms = wait.as_millis() as u64,
                error = %failure,
                "chunk upload failed"
            );
            sleep(wait).await;

            match self.remote_offset(&session.id).await {
                Ok(remote) if remote > session.next_offset => {
                    info!(
                        session_id = %session.id,
                        local = session.next_offset,
                        remote,
                        "reconciled with server offset"
                    );
                    self.confirm(session, remote).await;
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(session_id = %session.id, error = %e, "could not query server offset");
                }
            }
        }
    }

    /// Sends one chunk through the bridge, or claims a completion that an
    /// earlier run left behind for the same task.
    async fn send_chunk(
        &self,
        session: &TransferSession,
        chunk: &Chunk,
    ) -> Result<u64, CourierError> {
        let task_id = ChunkRequest::task_id_for(&session.id, chunk.offset);

        if let Some(outcome) = self.bridge.take_unclaimed(&task_id).await {
            // Outcomes from earlier runs count only up to the server's offset.
            match outcome.map(|response| upload_offset(&response)) {
                Ok(Some(offset)) if offset > chunk.offset => {
                    info!(task_id = %task_id, offset, "claimed completion from an earlier run");
                    return Ok(offset);
                }
                Ok(_) => debug!(task_id = %task_id, "earlier outcome has no usable offset; re-sending"),
                Err(e) => debug!(task_id = %task_id, error = %e, "discarding failed earlier outcome"),
            }
        }

        let file = self.bridge.stage(&task_id, &chunk.data).await?;
        let request = ChunkRequest {
            task_id,
            path: format!("{}/chunk", session_path(&session.id)),
            headers: vec![
                (UPLOAD_OFFSET_HEADER.to_string(), chunk.offset.to_string()),
                (UPLOAD_LENGTH_HEADER.to_string(), session.total_bytes.to_string()),
            ],
        };

        // Bytes in flight are not confirmed; they only show up in the detail.
        let status = self.status.clone();
        let base = chunk.offset;
        let total = session.total_bytes;
        let progress: ProgressCallback = Arc::new(move |sent, _| {
            status.phase(
                DeliveryPhase::Uploading,
                format!("{}/{total} bytes sent", base + sent),
            )
        });

        let response = self.bridge.upload_chunk(request, file, Some(progress)).await?;
        Ok(acknowledged_offset(&response, chunk))
    }

    async fn remote_offset(&self, session_id: &str) -> Result<u64, CourierError> {
        let remote: RemoteSession =
            serde_json::from_value(self.transport.get_json(&session_path(session_id)).await?)?;
        Ok(remote.offset)
    }

    /// Advances to `offset`, persists it, and publishes progress.
    async fn confirm(&self, session: &mut TransferSession, offset: u64) {
        session.advance_to(offset);
        if let Err(e) = self.offsets.save(&session.id, session.next_offset).await {
            warn!(session_id = %session.id, error = %e, "failed to persist offset");
        }
        self.status.advance(confirmed_fraction(
            session.next_offset,
            session.total_bytes,
        ));
    }
}

#[async_trait]
impl DeliveryStrategy for ResumableUploader {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Level3
    }

    async fn fetch(&self) -> Result<Vec<ContentItem>, CourierError> {
        fetch_timeline(self.transport.as_ref()).await
    }

    async fn submit(&self, request: SubmitRequest) -> Result<Submission, CourierError> {
        let Some(media) = request.media.as_deref() else {
            return Err(CourierError::Validation(
                "resumable delivery needs a media file".into(),
            ));
        };
        self.upload(&request.text, media)
            .await
            .map(Submission::Delivered)
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
    use crate::bridge::TransferEvent;
    use crate::session::TransportSession;
    use courier_test_utils::{MemoryOffsetStore, MockReply, MockTransport, created_tweet};
    use tempfile::TempDir;

    const CHUNK_PATH: &str = "/level3/uploads/s-1/chunk";
    const STATUS_PATH: &str = "/level3/uploads/s-1";
    const COMPLETE_PATH: &str = "/level3/uploads/s-1/complete";

    struct Fixture {
        dir: TempDir,
        transport: MockTransport,
        offsets: MemoryOffsetStore,
        uploader: ResumableUploader,
    }

    async fn fixture(payload: &[u8], server_offset: u64) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("clip.mp4"), payload)
            .await
            .unwrap();

        let transport = MockTransport::new();
        transport
            .otherwise(
                "POST",
                START_PATH,
                MockReply::json(
                    201,
                    serde_json::json!({"sessionId": "s-1", "nextOffset": server_offset}),
                ),
            )
            .await;
        transport
            .otherwise("PUT", CHUNK_PATH, MockReply::status(204))
            .await;
        transport
            .otherwise(
                "POST",
                COMPLETE_PATH,
                MockReply::json(201, created_tweet("t-1", "clip", "level3")),
            )
            .await;

        let offsets = MemoryOffsetStore::new();
        let shared: Arc<dyn Transport> = Arc::new(transport.clone());
        let bridge = TransferBridge::start(
            Arc::new(TransportSession::new(shared.clone())),
            dir.path().join("staging"),
        );
        let config = ResumableConfig {
            chunk_size: 4,
            max_chunk_retries: 5,
            chunk_retry_delay_ms: 500,
        };
        let uploader = ResumableUploader::new(shared, bridge, Arc::new(offsets.clone()), config);
        Fixture {
            dir,
            transport,
            offsets,
            uploader,
        }
    }

    fn media(f: &Fixture) -> std::path::PathBuf {
        f.dir.path().join("clip.mp4")
    }

    fn offsets_sent(calls: &[courier_test_utils::RecordedCall]) -> Vec<String> {
        calls
            .iter()
            .filter_map(|c| c.header(UPLOAD_OFFSET_HEADER).map(str::to_string))
            .collect()
    }

    #[tokio::test]
    async fn uploads_every_chunk_then_completes() {
        let f = fixture(b"0123456789", 0).await;
        let item = f.uploader.upload("clip", &media(&f)).await.unwrap();
        assert_eq!(item.id, "t-1");

        let puts = f.transport.calls_to("PUT", CHUNK_PATH).await;
        assert_eq!(puts.len(), 3);
        assert_eq!(offsets_sent(&puts), vec!["0", "4", "8"]);
        assert_eq!(puts[2].body, b"89");
        assert!(puts.iter().all(|c| c.header(UPLOAD_LENGTH_HEADER) == Some("10")));

        let start = &f.transport.calls_to("POST", START_PATH).await[0];
        assert_eq!(
            start.json(),
            serde_json::json!({"text": "clip", "filename": "clip.mp4", "totalBytes": 10})
        );
        assert_eq!(
            f.offsets.saves().await,
            vec![("s-1".to_string(), 4), ("s-1".to_string(), 8), ("s-1".to_string(), 10)]
        );
        assert_eq!(f.offsets.load("s-1").await.unwrap(), None);

        let status = f.uploader.status();
        assert_eq!(status.phase, DeliveryPhase::Delivered);
        assert_eq!(status.progress, 1.0);
    }

    #[tokio::test]
    async fn resumes_from_larger_of_server_and_stored_offset() {
        let f = fixture(b"0123456789", 4).await;
        f.offsets.save("s-1", 8).await.unwrap();

        f.uploader.upload("clip", &media(&f)).await.unwrap();
        let puts = f.transport.calls_to("PUT", CHUNK_PATH).await;
        assert_eq!(offsets_sent(&puts), vec!["8"]);
    }

    #[tokio::test]
    async fn server_acknowledged_offset_wins_when_larger() {
        let f = fixture(b"0123456789ab", 0).await;
        f.transport
            .script(
                "PUT",
                CHUNK_PATH,
                [MockReply::status(204).with_header("Upload-Offset", "8")],
            )
            .await;

        f.uploader.upload("clip", &media(&f)).await.unwrap();
        let puts = f.transport.calls_to("PUT", CHUNK_PATH).await;
        assert_eq!(offsets_sent(&puts), vec!["0", "8"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_chunk_reconciles_with_server_before_retrying() {
        let f = fixture(b"0123456789ab", 0).await;
        // Chunk at 4 reports failure but actually landed.
        f.transport
            .script(
                "PUT",
                CHUNK_PATH,
                [MockReply::status(204), MockReply::status(500)],
            )
            .await;
        f.transport
            .script(
                "GET",
                STATUS_PATH,
                [MockReply::json(
                    200,
                    serde_json::json!({"sessionId": "s-1", "offset": 8, "totalBytes": 12, "complete": false}),
                )],
            )
            .await;

        f.uploader.upload("clip", &media(&f)).await.unwrap();
        let puts = f.transport.calls_to("PUT", CHUNK_PATH).await;
        assert_eq!(offsets_sent(&puts), vec!["0", "4", "8"]);
        assert_eq!(f.transport.call_count("GET", STATUS_PATH).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_same_chunk_with_linear_pacing() {
        let f = fixture(b"01234567", 0).await;
        f.transport
            .script(
                "PUT",
                CHUNK_PATH,
                [MockReply::status(204), MockReply::network(), MockReply::status(503)],
            )
            .await;
        f.transport
            .otherwise(
                "GET",
                STATUS_PATH,
                MockReply::json(200, serde_json::json!({"sessionId": "s-1", "offset": 4})),
            )
            .await;

        f.uploader.upload("clip", &media(&f)).await.unwrap();
        let puts = f.transport.calls_to("PUT", CHUNK_PATH).await;
        assert_eq!(offsets_sent(&puts), vec!["0", "4", "4", "4"]);
        assert_eq!(puts[2].at - puts[1].at, std::time::Duration::from_millis(500));
        assert_eq!(puts[3].at - puts[2].at, std::time::Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_chunk_retries_aborts() {
        let f = fixture(b"01234567", 0).await;
        f.transport
            .script("PUT", CHUNK_PATH, [MockReply::status(204)])
            .await;
        f.transport
            .otherwise("PUT", CHUNK_PATH, MockReply::status(500))
            .await;
        f.transport
            .otherwise(
                "GET",
                STATUS_PATH,
                MockReply::json(200, serde_json::json!({"sessionId": "s-1", "offset": 4})),
            )
            .await;

        let err = f.uploader.upload("clip", &media(&f)).await.unwrap_err();
        assert!(matches!(err, CourierError::Terminal(_)));

        // One initial send plus five retries of the chunk at 4.
        let puts = f.transport.calls_to("PUT", CHUNK_PATH).await;
        assert_eq!(puts.len(), 1 + 6);
        assert_eq!(f.transport.call_count("GET", STATUS_PATH).await, 5);
        assert_eq!(f.transport.call_count("POST", COMPLETE_PATH).await, 0);
        // Confirmed progress survives for the next run.
        assert_eq!(f.offsets.load("s-1").await.unwrap(), Some(4));
        let status = f.uploader.status();
        assert_eq!(status.phase, DeliveryPhase::Failed);
        assert_eq!(status.progress, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_chunk_does_not_raise_progress() {
        let f = fixture(b"01234567", 0).await;
        f.transport
            .script("PUT", CHUNK_PATH, [MockReply::status(204)])
            .await;
        f.transport
            .otherwise("PUT", CHUNK_PATH, MockReply::status(502))
            .await;
        f.transport
            .otherwise(
                "GET",
                STATUS_PATH,
                MockReply::json(200, serde_json::json!({"sessionId": "s-1", "offset": 4})),
            )
            .await;

        f.uploader.upload("clip", &media(&f)).await.unwrap_err();

        let persisted = f.offsets.load("s-1").await.unwrap().unwrap();
        assert_eq!(persisted, 4);
        let status = f.uploader.status();
        assert_eq!(status.progress, persisted as f64 / 8.0);
    }

    #[tokio::test]
    async fn earlier_outcome_counts_only_the_server_offset() {
        // The earlier run used two-byte chunks.
        let f = fixture(b"01234567", 0).await;
        let bridge = f.uploader.bridge().clone();

        let (drained_tx, drained_rx) = tokio::sync::oneshot::channel();
        bridge
            .handle_background_wake(Box::new(move || {
                let _ = drained_tx.send(());
            }))
            .await;
        let events = bridge.event_sender();
        events
            .send(TransferEvent::Completed {
                task_id: "s-1@0".into(),
                result: Ok(HttpResponse {
                    status: 204,
                    headers: vec![("upload-offset".into(), "2".into())],
                    body: Vec::new(),
                }),
            })
            .unwrap();
        events.send(TransferEvent::EventsDrained).unwrap();
        drained_rx.await.unwrap();

        f.uploader.upload("clip", &media(&f)).await.unwrap();
        let puts = f.transport.calls_to("PUT", CHUNK_PATH).await;
        assert_eq!(offsets_sent(&puts), vec!["2", "6"]);
    }

    #[tokio::test]
    async fn earlier_outcome_without_offset_is_resent() {
        let f = fixture(b"0123", 0).await;
        let bridge = f.uploader.bridge().clone();

        let (drained_tx, drained_rx) = tokio::sync::oneshot::channel();
        bridge
            .handle_background_wake(Box::new(move || {
                let _ = drained_tx.send(());
            }))
            .await;
        let events = bridge.event_sender();
        events
            .send(TransferEvent::Completed {
                task_id: "s-1@0".into(),
                result: Ok(HttpResponse {
                    status: 204,
                    headers: Vec::new(),
                    body: Vec::new(),
                }),
            })
            .unwrap();
        events.send(TransferEvent::EventsDrained).unwrap();
        drained_rx.await.unwrap();

        f.uploader.upload("clip", &media(&f)).await.unwrap();
        let puts = f.transport.calls_to("PUT", CHUNK_PATH).await;
        assert_eq!(offsets_sent(&puts), vec!["0"]);
    }

    #[tokio::test]
    async fn completed_session_drops_its_leftover_outcomes() {
        let f = fixture(b"0123", 0).await;
        let bridge = f.uploader.bridge().clone();

        let (drained_tx, drained_rx) = tokio::sync::oneshot::channel();
        bridge
            .handle_background_wake(Box::new(move || {
                let _ = drained_tx.send(());
            }))
            .await;
        let events = bridge.event_sender();
        // Left behind by a run that used a larger offset grid.
        events
            .send(TransferEvent::Completed {
                task_id: "s-1@8".into(),
                result: Ok(HttpResponse {
                    status: 204,
                    headers: Vec::new(),
                    body: Vec::new(),
                }),
            })
            .unwrap();
        events.send(TransferEvent::EventsDrained).unwrap();
        drained_rx.await.unwrap();

        f.uploader.upload("clip", &media(&f)).await.unwrap();
        assert!(bridge.take_unclaimed("s-1@8").await.is_none());
    }

    #[tokio::test]
    async fn rejected_completion_keeps_offset() {
        let f = fixture(b"0123", 0).await;
        f.transport
            .script("POST", COMPLETE_PATH, [MockReply::status(409)])
            .await;

        let err = f.uploader.upload("clip", &media(&f)).await.unwrap_err();
        assert!(matches!(err, CourierError::Http { status: 409, .. }));
        assert_eq!(f.offsets.load("s-1").await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn claims_completion_left_by_an_earlier_run() {
        let f = fixture(b"01234567", 0).await;
        let bridge = f.uploader.bridge().clone();

        // Relaunch: the system replays the completion of chunk 0 before any
        // upload call is waiting for it.
        let (drained_tx, drained_rx) = tokio::sync::oneshot::channel();
        bridge
            .handle_background_wake(Box::new(move || {
                let _ = drained_tx.send(());
            }))
            .await;
        let events = bridge.event_sender();
        events
            .send(TransferEvent::Completed {
                task_id: "s-1@0".into(),
                result: Ok(HttpResponse {
                    status: 204,
                    headers: vec![("upload-offset".into(), "4".into())],
                    body: Vec::new(),
                }),
            })
            .unwrap();
        events.send(TransferEvent::EventsDrained).unwrap();
        drained_rx.await.unwrap();

        f.uploader.upload("clip", &media(&f)).await.unwrap();
        let puts = f.transport.calls_to("PUT", CHUNK_PATH).await;
        assert_eq!(offsets_sent(&puts), vec!["4"]);
        assert!(bridge.take_unclaimed("s-1@0").await.is_none());
    }

    #[tokio::test]
    async fn validation_errors_make_no_requests() {
        let f = fixture(b"", 0).await;
        let err = f.uploader.upload("clip", &media(&f)).await.unwrap_err();
        assert!(matches!(err, CourierError::Validation(_)));

        let err = f
            .uploader
            .submit(SubmitRequest::new("no media"))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Validation(_)));
        assert!(f.transport.calls().await.is_empty());
    }

    #[test]
    fn progress_is_clamped_until_finalized() {
        assert_eq!(confirmed_fraction(5, 10), 0.5);
        assert_eq!(confirmed_fraction(10, 10), MAX_UNFINALIZED_PROGRESS);
        assert_eq!(confirmed_fraction(0, 0), 0.0);
    }
}
