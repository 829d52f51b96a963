// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background transfer bridge.
//!
//! A chunk upload is handed to a [`BackgroundSession`], which may finish it
//! long after the initiating call, or in a later process. Sessions report
//! back through [`TransferEvent`]s on one channel; a single pump task matches
//! each terminal event to the awaiting caller by task id.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use courier_core::types::HttpResponse;
use courier_core::{CourierError, ProgressCallback};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, warn};

/// Result delivered for one chunk task.
pub type ChunkResult = Result<HttpResponse, CourierError>;

/// What a background session needs to upload one staged chunk.
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    /// Stable per-chunk identifier, `{session_id}@{offset}`.
    pub task_id: String,
    /// Request path relative to the transport base URL.
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl ChunkRequest {
    pub fn task_id_for(session_id: &str, offset: u64) -> String {
        format!("{session_id}@{offset}")
    }
}

/// Events a background session reports.
#[derive(Debug)]
pub enum TransferEvent {
    Progress {
        task_id: String,
        sent: u64,
        total: u64,
    },
    /// Exactly one per started task. `Ok` carries whatever the server
    /// answered, including non-2xx statuses.
    Completed { task_id: String, result: ChunkResult },
    /// The system has delivered every event queued for the current wake.
    EventsDrained,
}

/// The mechanism that actually moves bytes.
///
/// `start` returns immediately; the session later sends zero or more
/// `Progress` events and then exactly one `Completed` for the task on
/// `events`.
pub trait BackgroundSession: Send + Sync + 'static {
    fn start(
        &self,
        request: ChunkRequest,
        file: PathBuf,
        events: mpsc::UnboundedSender<TransferEvent>,
    );
}

struct PendingChunk {
    completion: oneshot::Sender<ChunkResult>,
    progress: Option<ProgressCallback>,
    file: PathBuf,
}

type PendingMap = Arc<Mutex<HashMap<String, PendingChunk>>>;
type UnclaimedMap = Arc<Mutex<HashMap<String, ChunkResult>>>;
type WakeCompletion = Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>;

/// Turns asynchronous per-chunk events into one awaited result per chunk.
///
/// Construct once per process with [`TransferBridge::start`] and share the
/// returned `Arc`.
pub struct TransferBridge {
    session: Arc<dyn BackgroundSession>,
    staging_dir: PathBuf,
    pending: PendingMap,
    unclaimed: UnclaimedMap,
    wake_completion: WakeCompletion,
    events: mpsc::UnboundedSender<TransferEvent>,
}

impl TransferBridge {
    /// Creates the bridge and spawns its event pump on the current runtime.
    pub fn start(session: Arc<dyn BackgroundSession>, staging_dir: impl Into<PathBuf>) -> Arc<Self> {
        let (events, rx) = mpsc::unbounded_channel();
        let bridge = Arc::new(Self {
            session,
            staging_dir: staging_dir.into(),
            pending: Arc::new(Mutex::new(HashMap::new())),
            unclaimed: Arc::new(Mutex::new(HashMap::new())),
            wake_completion: Arc::new(Mutex::new(None)),
            events,
        });

        tokio::spawn(event_pump(
            rx,
            bridge.staging_dir.clone(),
            bridge.pending.clone(),
            bridge.unclaimed.clone(),
            bridge.wake_completion.clone(),
        ));
        bridge
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Path of the staged file for `task_id`.
    pub fn staged_path(&self, task_id: &str) -> PathBuf {
        staged_path(&self.staging_dir, task_id)
    }

    /// Writes `bytes` to the staged file for `task_id` and returns its path.
    pub async fn stage(&self, task_id: &str, bytes: &[u8]) -> Result<PathBuf, CourierError> {
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let path = self.staged_path(task_id);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Uploads the staged `file` and waits for its terminal event.
    ///
    /// `file` is deleted once the task resolves, whatever the outcome. A
    /// non-2xx answer resolves as [`CourierError::Http`].
    pub async fn upload_chunk(
        &self,
        request: ChunkRequest,
        file: PathBuf,
        on_progress: Option<ProgressCallback>,
    ) -> ChunkResult {
        let task_id = request.task_id.clone();
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.contains_key(&task_id) {
                drop(pending);
                remove_staged(&file).await;
                return Err(CourierError::Internal(format!(
                    "chunk task {task_id} is already in flight"
                )));
            }
            pending.insert(
                task_id.clone(),
                PendingChunk {
                    completion: tx,
                    progress: on_progress,
                    file: file.clone(),
                },
            );
        }

        debug!(task_id = %task_id, "starting chunk transfer");
        self.session.start(request, file, self.events.clone());

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(CourierError::Internal(format!(
                "transfer bridge stopped before chunk task {task_id} resolved"
            ))),
        }
    }

    /// Removes and returns the outcome of a task that completed with nobody
    /// waiting for it.
    pub async fn take_unclaimed(&self, task_id: &str) -> Option<ChunkResult> {
        self.unclaimed.lock().await.remove(task_id)
    }

    /// Drops every unclaimed outcome belonging to `session_id`. Returns how
    /// many were dropped.
    pub async fn discard_session(&self, session_id: &str) -> usize {
        let prefix = format!("{session_id}@");
        let mut unclaimed = self.unclaimed.lock().await;
        let before = unclaimed.len();
        unclaimed.retain(|task_id, _| !task_id.starts_with(&prefix));
        let dropped = before - unclaimed.len();
        if dropped > 0 {
            debug!(session_id, dropped, "discarded unclaimed chunk outcomes");
        }
        dropped
    }

    /// Registers the system callback for the current background wake. It is
    /// invoked once the session reports [`TransferEvent::EventsDrained`].
    pub async fn handle_background_wake(&self, completion: Box<dyn FnOnce() + Send>) {
        info!("background transfer wake registered");
        *self.wake_completion.lock().await = Some(completion);
    }

    /// Sender for system-delivered events, e.g. completions replayed after a
    /// relaunch.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<TransferEvent> {
        self.events.clone()
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

fn staged_path(dir: &Path, task_id: &str) -> PathBuf {
    let name: String = task_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    dir.join(format!("{name}.chunk"))
}

async fn remove_staged(file: &Path) {
    match tokio::fs::remove_file(file).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(file = %file.display(), error = %e, "failed to remove staged chunk"),
    }
}

fn into_chunk_result(result: ChunkResult) -> ChunkResult {
    result.and_then(HttpResponse::error_for_status)
}

async fn event_pump(
    mut rx: mpsc::UnboundedReceiver<TransferEvent>,
    staging_dir: PathBuf,
    pending: PendingMap,
    unclaimed: UnclaimedMap,
    wake_completion: WakeCompletion,
) {
    while let Some(event) = rx.recv().await {
        match event {
            TransferEvent::Progress {
                task_id,
                sent,
                total,
            } => {
                let progress = pending
                    .lock()
                    .await
                    .get(&task_id)
                    .and_then(|p| p.progress.clone());
                if let Some(progress) = progress {
                    progress(sent, total);
                }
            }
            TransferEvent::Completed { task_id, result } => {
                let result = into_chunk_result(result);
                let entry = pending.lock().await.remove(&task_id);
                match entry {
                    Some(chunk) => {
                        remove_staged(&chunk.file).await;
                        if let Err(result) = chunk.completion.send(result) {
                            debug!(task_id = %task_id, "chunk awaiter is gone; keeping outcome");
                            unclaimed.lock().await.insert(task_id, result);
                        }
                    }
                    None => {
                        info!(task_id = %task_id, "completion for a task with no awaiter");
                        remove_staged(&staged_path(&staging_dir, &task_id)).await;
                        unclaimed.lock().await.insert(task_id, result);
                    }
                }
            }
            TransferEvent::EventsDrained => {
                if let Some(completion) = wake_completion.lock().await.take() {
                    debug!("background events drained; signalling wake completion");
                    completion();
                }
            }
        }
    }
    debug!("transfer event pump stopped");
}
