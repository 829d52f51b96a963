// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Foreground delivery strategies for Courier.
//!
//! - [`SingleShotDelivery`]: one attempt, failures logged and swallowed.
//! - [`RetryEngine`]: exponential backoff, capped retries behind a
//!   [`CircuitBreaker`], manual retry, and idempotency-keyed retry, all over
//!   the same [`send_attempt`] primitive.

pub mod attempt;
pub mod backoff;
pub mod circuit;
pub mod engine;
pub mod single;

pub use attempt::{AttemptOutcome, IDEMPOTENCY_HEADER, RETRY_PATH, send_attempt};
pub use circuit::CircuitBreaker;
pub use engine::RetryEngine;
pub use single::{SINGLE_PATH, SingleShotDelivery};
