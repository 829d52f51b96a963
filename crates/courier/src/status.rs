// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier status` command implementation.
//!
//! Reports the effective configuration plus whatever delivery state is
//! persisted locally: outstanding queue jobs and unfinished resumable
//! transfers.

use courier_config::CourierConfig;
use courier_core::{CourierError, DeliveryJob};
use courier_storage::queries::jobs;
use courier_storage::{Database, SqliteOffsetStore};
use serde::Serialize;

/// Structured output for `--json`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub strategy: String,
    pub base_url: String,
    pub database_path: String,
    pub outstanding_jobs: Vec<JobSummary>,
    pub unfinished_transfers: Vec<TransferSummary>,
}

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub state: String,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: String,
}

impl From<DeliveryJob> for JobSummary {
    fn from(job: DeliveryJob) -> Self {
        Self {
            id: job.id,
            state: job.state.to_string(),
            attempts: job.attempts,
            last_error: job.last_error,
            created_at: job.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferSummary {
    pub session_id: String,
    pub offset: u64,
}

pub async fn collect(config: &CourierConfig) -> Result<StatusReport, CourierError> {
    let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;
    let outstanding_jobs = jobs::list_outstanding(&db, None)
        .await?
        .into_iter()
        .map(JobSummary::from)
        .collect();
    let unfinished_transfers = SqliteOffsetStore::new(db.clone())
        .entries()
        .await?
        .into_iter()
        .map(|(session_id, offset)| TransferSummary { session_id, offset })
        .collect();
    db.close().await?;

    Ok(StatusReport {
        strategy: config.delivery.strategy.to_string(),
        base_url: config.client.base_url.clone(),
        database_path: config.storage.database_path.clone(),
        outstanding_jobs,
        unfinished_transfers,
    })
}

/// Runs `courier status`.
pub async fn run_status(config: &CourierConfig, json: bool) -> Result<(), CourierError> {
    let report = collect(config).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("strategy:  {}", report.strategy);
    println!("service:   {}", report.base_url);
    println!("database:  {}", report.database_path);
    println!("jobs:      {} outstanding", report.outstanding_jobs.len());
    for job in &report.outstanding_jobs {
        let error = job.last_error.as_deref().unwrap_or("-");
        println!(
            "  {}  {:<9}  attempts={}  {}",
            job.id, job.state, job.attempts, error
        );
    }
    println!("transfers: {} unfinished", report.unfinished_transfers.len());
    for transfer in &report.unfinished_transfers {
        println!("  {}  offset={}", transfer.session_id, transfer.offset);
    }
    Ok(())
}
