// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier delivery engines.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types shared by the four delivery strategies and the adapters they
//! send and persist through.

pub mod error;
pub mod status;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CourierError, ErrorKind};
pub use status::{DeliveryPhase, DeliveryStatus, StatusReporter};
pub use types::{
    ContentItem, DeliveryJob, HttpResponse, JobState, ProgressCallback, RetryDiscipline,
    StrategyKind, SubmitRequest, Submission, TransferSession, UserOutcome,
};

pub use traits::{DeliveryStrategy, Headers, OffsetStore, Transport, fetch_timeline};
