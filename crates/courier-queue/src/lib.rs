// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable delivery for Courier.
//!
//! Posts are persisted as jobs in SQLite and delivered by one background
//! drain loop. Jobs interrupted by a crash are recovered at startup.

pub mod queue;

pub use queue::{JobOutcome, JobQueue, QUEUE_PATH};
