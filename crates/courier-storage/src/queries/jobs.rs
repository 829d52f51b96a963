// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable delivery job operations.
//!
//! Every job row is outstanding: success deletes the row. "Oldest" means
//! ordered by `created_at`, ties broken by insertion order.

use std::str::FromStr;

use courier_core::{CourierError, DeliveryJob, JobState};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};

const JOB_COLUMNS: &str = "id, text, state, attempts, last_error, created_at, updated_at";

fn row_to_job(row: &Row<'_>) -> Result<DeliveryJob, rusqlite::Error> {
    let state: String = row.get(2)?;
    let state = JobState::from_str(&state).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DeliveryJob {
        id: row.get(0)?,
        text: row.get(1)?,
        state,
        attempts: row.get(3)?,
        last_error: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Persists a new job as given.
pub async fn insert_job(db: &Database, job: &DeliveryJob) -> Result<(), CourierError> {
    let job = job.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO jobs (id, text, state, attempts, last_error, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    job.id,
                    job.text,
                    job.state.as_str(),
                    job.attempts,
                    job.last_error,
                    job.created_at,
                    job.updated_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetches one job by id.
pub async fn get_job(db: &Database, id: &str) -> Result<Option<DeliveryJob>, CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<DeliveryJob>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                params![id],
                row_to_job,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically selects the oldest `pending` or `failed` job and moves it to
/// `uploading`, incrementing its attempt counter.
///
/// Returns `None` when nothing is eligible.
pub async fn claim_next(db: &Database) -> Result<Option<DeliveryJob>, CourierError> {
    db.connection()
        .call(|conn| -> Result<Option<DeliveryJob>, rusqlite::Error> {
            let tx = conn.transaction()?;

            let candidate = tx
                .query_row(
                    &format!(
                        "SELECT {JOB_COLUMNS} FROM jobs
                         WHERE state IN ('pending', 'failed')
                         ORDER BY created_at ASC, rowid ASC
                         LIMIT 1"
                    ),
                    [],
                    row_to_job,
                )
                .optional()?;

            let Some(job) = candidate else {
                tx.commit()?;
                return Ok(None);
            };

            let claimed = tx.query_row(
                &format!(
                    "UPDATE jobs SET state = 'uploading', attempts = attempts + 1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1
                     RETURNING {JOB_COLUMNS}"
                ),
                params![job.id],
                row_to_job,
            )?;
            tx.commit()?;
            Ok(Some(claimed))
        })
        .await
        .map_err(map_tr_err)
}

/// Removes a job after successful delivery.
pub async fn delete_job(db: &Database, id: &str) -> Result<(), CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Moves a job to `failed`, recording the error message.
pub async fn mark_failed(db: &Database, id: &str, error: &str) -> Result<(), CourierError> {
    let id = id.to_string();
    let error = error.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE jobs SET state = 'failed', last_error = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![error, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Forces every `uploading` job back to `pending`. Returns how many moved.
pub async fn reset_uploading(db: &Database) -> Result<usize, CourierError> {
    db.connection()
        .call(|conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE jobs SET state = 'pending',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE state = 'uploading'",
                [],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Counts jobs that have not been delivered.
pub async fn count_outstanding(db: &Database) -> Result<usize, CourierError> {
    db.connection()
        .call(|conn| -> Result<usize, rusqlite::Error> {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
        .await
        .map_err(map_tr_err)
}

/// Lists undelivered jobs, optionally restricted to one state, oldest first.
pub async fn list_outstanding(
    db: &Database,
    state: Option<JobState>,
) -> Result<Vec<DeliveryJob>, CourierError> {
    db.connection()
        .call(move |conn| -> Result<Vec<DeliveryJob>, rusqlite::Error> {
            let jobs = match state {
                Some(state) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {JOB_COLUMNS} FROM jobs WHERE state = ?1
                         ORDER BY created_at ASC, rowid ASC"
                    ))?;
                    let rows = stmt.query_map(params![state.as_str()], row_to_job)?;
                    rows.collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at ASC, rowid ASC"
                    ))?;
                    let rows = stmt.query_map([], row_to_job)?;
                    rows.collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(jobs)
        })
        .await
        .map_err(map_tr_err)
}
