// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier delivers posts to a remote service through one of four
//! strategies, selected by configuration.
//!
//! [`Courier`] is the façade: one variant per engine, each implementing
//! [`DeliveryStrategy`], with the façade forwarding every call unchanged.

pub mod shutdown;

use std::sync::Arc;

use async_trait::async_trait;
use courier_config::CourierConfig;
use courier_core::{
    ContentItem, CourierError, DeliveryStatus, DeliveryStrategy, StrategyKind, SubmitRequest,
    Submission, Transport,
};
use courier_queue::JobQueue;
use courier_resilience::{RetryEngine, SingleShotDelivery};
use courier_storage::{Database, SqliteOffsetStore};
use courier_transfer::{ResumableUploader, TransferBridge, TransportSession};
use courier_transport::HttpTransport;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The delivery engine chosen for this process.
pub enum Courier {
    Single(SingleShotDelivery),
    Retry(RetryEngine),
    Resumable(ResumableUploader),
    Queued(Arc<JobQueue>),
}

impl Courier {
    /// Builds the engine named by `[delivery] strategy` over HTTP.
    pub async fn from_config(
        config: &CourierConfig,
        cancel: CancellationToken,
    ) -> Result<Self, CourierError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config.client)?);
        Self::build(config, config.delivery.strategy, transport, cancel).await
    }

    /// Builds the engine for `kind` over `transport`.
    ///
    /// Engines that persist state open the configured database. The queued
    /// engine runs crash recovery before it is returned.
    pub async fn build(
        config: &CourierConfig,
        kind: StrategyKind,
        transport: Arc<dyn Transport>,
        cancel: CancellationToken,
    ) -> Result<Self, CourierError> {
        let courier = match kind {
            StrategyKind::Level1 => Courier::Single(SingleShotDelivery::new(transport)),
            StrategyKind::Level2 => {
                Courier::Retry(RetryEngine::new(transport, config.retry.clone()))
            }
            StrategyKind::Level3 => {
                let db = open_database(config).await?;
                let bridge = TransferBridge::start(
                    Arc::new(TransportSession::new(transport.clone())),
                    &config.storage.staging_dir,
                );
                Courier::Resumable(ResumableUploader::new(
                    transport,
                    bridge,
                    Arc::new(SqliteOffsetStore::new(db)),
                    config.resumable.clone(),
                ))
            }
            StrategyKind::Level4 => {
                let db = open_database(config).await?;
                let queue = JobQueue::new(db, transport, config.queue.clone(), cancel);
                queue.recover_outstanding_jobs().await?;
                Courier::Queued(queue)
            }
        };
        info!(strategy = %kind, "delivery engine ready");
        Ok(courier)
    }

    fn engine(&self) -> &dyn DeliveryStrategy {
        match self {
            Courier::Single(engine) => engine,
            Courier::Retry(engine) => engine,
            Courier::Resumable(engine) => engine,
            Courier::Queued(queue) => queue.as_ref(),
        }
    }

    /// The job queue, when this is the queued engine.
    pub fn queue(&self) -> Option<&Arc<JobQueue>> {
        match self {
            Courier::Queued(queue) => Some(queue),
            _ => None,
        }
    }
}

async fn open_database(config: &CourierConfig) -> Result<Database, CourierError> {
    Database::open_with(&config.storage.database_path, config.storage.wal_mode).await
}

#[async_trait]
impl DeliveryStrategy for Courier {
    fn kind(&self) -> StrategyKind {
        self.engine().kind()
    }

    async fn fetch(&self) -> Result<Vec<ContentItem>, CourierError> {
        self.engine().fetch().await
    }

    async fn submit(&self, request: SubmitRequest) -> Result<Submission, CourierError> {
        self.engine().submit(request).await
    }

    fn status(&self) -> DeliveryStatus {
        self.engine().status()
    }

    fn subscribe(&self) -> watch::Receiver<DeliveryStatus> {
        self.engine().subscribe()
    }
}
