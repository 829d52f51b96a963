// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP-backed background session.

use std::path::PathBuf;
use std::sync::Arc;

use courier_core::{ProgressCallback, Transport};
use tokio::sync::mpsc;
use tracing::debug;

use crate::bridge::{BackgroundSession, ChunkRequest, TransferEvent};

/// Uploads staged chunks with `PUT` through a [`Transport`] on a spawned
/// task, reporting progress and one completion per task.
pub struct TransportSession {
    transport: Arc<dyn Transport>,
}

impl TransportSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl BackgroundSession for TransportSession {
    fn start(
        &self,
        request: ChunkRequest,
        file: PathBuf,
        events: mpsc::UnboundedSender<TransferEvent>,
    ) {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            let result = match tokio::fs::read(&file).await {
                Ok(bytes) => {
                    let progress_events = events.clone();
                    let task_id = request.task_id.clone();
                    let progress: ProgressCallback = Arc::new(move |sent, total| {
                        let _ = progress_events.send(TransferEvent::Progress {
                            task_id: task_id.clone(),
                            sent,
                            total,
                        });
                    });
                    transport
                        .put_bytes(&request.path, bytes, &request.headers, Some(progress))
                        .await
                }
                Err(e) => Err(e.into()),
            };

            debug!(task_id = %request.task_id, ok = result.is_ok(), "chunk transfer finished");
            // The bridge may already be gone during teardown.
            let _ = events.send(TransferEvent::Completed {
                task_id: request.task_id,
                result,
            });
        });
    }
}
