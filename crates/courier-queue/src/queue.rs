// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable job queue with a single background drain loop.
//!
//! Jobs move `pending -> uploading -> (deleted | failed)`; `failed` jobs stay
//! eligible and are picked up again, oldest first, on the next iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use courier_config::QueueConfig;
use courier_core::types::CreatedItem;
use courier_core::{
    ContentItem, CourierError, DeliveryJob, DeliveryPhase, DeliveryStatus, DeliveryStrategy,
    JobState, StatusReporter, StrategyKind, SubmitRequest, Submission, Transport, fetch_timeline,
};
use courier_storage::Database;
use courier_storage::queries::jobs;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Create-post endpoint of the queued strategy.
pub const QUEUE_PATH: &str = "/level4/tweets";

/// What one drain iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Delivered { job_id: String, item: ContentItem },
    Failed { job_id: String, error: String },
}

fn timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Persisted FIFO of delivery jobs.
///
/// Built with [`JobQueue::new`], which returns the shared handle the drain
/// task runs on.
pub struct JobQueue {
    this: Weak<JobQueue>,
    db: Database,
    transport: Arc<dyn Transport>,
    config: QueueConfig,
    draining: AtomicBool,
    cancel: CancellationToken,
    status: StatusReporter,
}

impl JobQueue {
    pub fn new(
        db: Database,
        transport: Arc<dyn Transport>,
        config: QueueConfig,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            db,
            transport,
            config,
            draining: AtomicBool::new(false),
            cancel,
            status: StatusReporter::new(),
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Crash recovery: every job left `uploading` by a previous process goes
    /// back to `pending`. Run once at startup before any other queue call.
    pub async fn recover_outstanding_jobs(&self) -> Result<usize, CourierError> {
        let recovered = jobs::reset_uploading(&self.db).await?;
        if recovered > 0 {
            warn!(count = recovered, "recovered jobs interrupted mid-delivery");
        } else {
            debug!("no interrupted jobs to recover");
        }
        self.refresh_outstanding().await?;
        Ok(recovered)
    }

    /// Persists a `pending` job for `text` and starts a drain if none is
    /// running (and auto-drain is on).
    pub async fn enqueue(&self, text: &str) -> Result<Submission, CourierError> {
        if text.trim().is_empty() {
            return Err(CourierError::Validation("post text must not be empty".into()));
        }

        let now = timestamp();
        let job = DeliveryJob {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            state: JobState::Pending,
            attempts: 0,
            last_error: None,
            created_at: now.clone(),
            updated_at: now,
        };
        jobs::insert_job(&self.db, &job).await?;
        info!(job_id = %job.id, "job enqueued");
        self.refresh_outstanding().await?;

        if self.config.auto_drain {
            self.spawn_drain();
        }
        Ok(Submission::Queued { job_id: job.id })
    }

    /// Spawns [`drain`](Self::drain) unless one is already running.
    pub fn spawn_drain(&self) -> Option<JoinHandle<()>> {
        if self.is_draining() {
            return None;
        }
        let queue = self.this.upgrade()?;
        Some(tokio::spawn(async move {
            if let Err(e) = queue.drain().await {
                error!(error = %e, "drain loop stopped on a storage error");
            }
        }))
    }

    /// Processes jobs one at a time until none is eligible or the queue is
    /// cancelled. Returns the number delivered. A call made while another
    /// drain is running returns `Ok(0)` at once.
    pub async fn drain(&self) -> Result<usize, CourierError> {
        let mut delivered = 0;
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                debug!("drain already running");
                return Ok(delivered);
            }

            self.status.phase(DeliveryPhase::Draining, "draining");
            let pass = self.drain_pass().await;
            self.draining.store(false, Ordering::Release);
            delivered += pass?;

            // A job enqueued while the guard was held saw a busy drain and
            // did not start one.
            if self.cancel.is_cancelled() || self.eligible_count().await? == 0 {
                break;
            }
        }

        let outstanding = self.refresh_outstanding().await?;
        self.status.phase(
            DeliveryPhase::Idle,
            format!("{outstanding} outstanding"),
        );
        Ok(delivered)
    }

    async fn drain_pass(&self) -> Result<usize, CourierError> {
        let mut delivered = 0;
        loop {
            if self.cancel.is_cancelled() {
                info!("drain cancelled; remaining jobs stay outstanding");
                break;
            }
            match self.process_next().await? {
                None => break,
                Some(JobOutcome::Delivered { .. }) => delivered += 1,
                Some(JobOutcome::Failed { .. }) => {
                    let pause = self.config.failure_pause();
                    debug!(delay_ms = pause.as_millis() as u64, "pausing after failed job");
                    tokio::select! {
                        _ = self.cancel.cancelled() => {}
                        _ = sleep(pause) => {}
                    }
                }
            }
        }
        Ok(delivered)
    }

    /// Claims the oldest eligible job and attempts delivery once.
    ///
    /// Delivery failures are recorded on the job, never returned; only
    /// storage errors are.
    pub async fn process_next(&self) -> Result<Option<JobOutcome>, CourierError> {
        let Some(job) = jobs::claim_next(&self.db).await? else {
            return Ok(None);
        };
        self.status.phase(
            DeliveryPhase::Sending,
            format!("job {} attempt {}", job.id, job.attempts),
        );

        let body = serde_json::json!({ "text": job.text });
        let result = match self.transport.post_json(QUEUE_PATH, &body).await {
            Ok(value) => serde_json::from_value::<CreatedItem>(value).map_err(CourierError::from),
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(created) => {
                jobs::delete_job(&self.db, &job.id).await?;
                info!(job_id = %job.id, attempts = job.attempts, id = %created.tweet.id, "job delivered");
                JobOutcome::Delivered {
                    job_id: job.id,
                    item: created.tweet,
                }
            }
            Err(e) => {
                let message = e.to_string();
                jobs::mark_failed(&self.db, &job.id, &message).await?;
                warn!(job_id = %job.id, attempts = job.attempts, error = %message, "job delivery failed");
                JobOutcome::Failed {
                    job_id: job.id,
                    error: message,
                }
            }
        };
        self.refresh_outstanding().await?;
        Ok(Some(outcome))
    }

    /// Point-in-time count of jobs not yet delivered.
    pub async fn outstanding_count(&self) -> Result<usize, CourierError> {
        jobs::count_outstanding(&self.db).await
    }

    /// Undelivered jobs, oldest first.
    pub async fn outstanding_jobs(&self) -> Result<Vec<DeliveryJob>, CourierError> {
        jobs::list_outstanding(&self.db, None).await
    }

    async fn eligible_count(&self) -> Result<usize, CourierError> {
        Ok(self
            .outstanding_jobs()
            .await?
            .iter()
            .filter(|job| job.state != JobState::Uploading)
            .count())
    }

    async fn refresh_outstanding(&self) -> Result<usize, CourierError> {
        let count = self.outstanding_count().await?;
        self.status.outstanding(count);
        Ok(count)
    }
}

#[async_trait]
impl DeliveryStrategy for JobQueue {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Level4
    }

    async fn fetch(&self) -> Result<Vec<ContentItem>, CourierError> {
        fetch_timeline(self.transport.as_ref()).await
    }

    async fn submit(&self, request: SubmitRequest) -> Result<Submission, CourierError> {
        self.enqueue(&request.text).await
    }

    fn status(&self) -> DeliveryStatus {
        self.status.snapshot()
    }

    fn subscribe(&self) -> watch::Receiver<DeliveryStatus> {
        self.status.subscribe()
    }
}
