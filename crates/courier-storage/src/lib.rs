// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Courier delivery engines.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, the resumable transfer offset map,
//! and the durable job store behind the job queue.

pub mod database;
pub mod migrations;
pub mod offsets;
pub mod queries;

pub use database::Database;
pub use offsets::{OFFSETS_KEY, SqliteOffsetStore};
