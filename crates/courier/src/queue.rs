// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier queue` command implementation.

use std::sync::Arc;

use courier::Courier;
use courier::shutdown::install_signal_handler;
use courier_config::CourierConfig;
use courier_core::{CourierError, DeliveryStrategy, StrategyKind, Transport};
use courier_queue::JobQueue;
use courier_transport::HttpTransport;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Recovers interrupted jobs, drains until the queue is empty or the
/// process is interrupted, then reports what is left.
pub async fn run_queue(config: &CourierConfig) -> Result<(), CourierError> {
    let cancel = install_signal_handler();
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config.client)?);
    // Building the queued engine runs crash recovery.
    let courier = Courier::build(config, StrategyKind::Level4, transport, cancel.clone()).await?;
    let Some(queue) = courier.queue() else {
        return Err(CourierError::Internal("queued engine unavailable".into()));
    };

    let before = queue.outstanding_count().await?;
    println!("{before} job(s) outstanding");
    let outstanding = wait_for_queue(queue, &cancel).await?;
    println!("{} delivered, {outstanding} outstanding", before.saturating_sub(outstanding));
    Ok(())
}

/// Drains inline, or waits for the drain already running, until the queue
/// is idle or `cancel` fires. Returns the outstanding count afterwards.
pub async fn wait_for_queue(
    queue: &Arc<JobQueue>,
    cancel: &CancellationToken,
) -> Result<usize, CourierError> {
    let mut updates = queue.subscribe();
    let delivered = queue.drain().await?;
    info!(delivered, "drain returned");

    while queue.is_draining() {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    queue.outstanding_count().await
}
