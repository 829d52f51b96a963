// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier delivery engines.

use std::time::Duration;

use strum::Display;
use thiserror::Error;

use crate::types::{StatusClass, classify_status};

/// The primary error type used across all Courier engines and adapters.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, bad base URL, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Caller input is unusable (empty text, missing or empty media payload).
    #[error("validation error: {0}")]
    Validation(String),

    /// The request never produced an HTTP response.
    #[error("network error: {message}")]
    Network {
        message: String,
        /// Connectivity and timeout failures are retryable; anything else is not.
        retryable: bool,
    },

    /// The remote service answered with a non-2xx status.
    #[error("remote service returned {status}: {body}")]
    Http { status: u16, body: String },

    /// The remote service answered 2xx but the body did not match the contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A non-retryable failure, or a retry budget that ran out.
    #[error("{0}")]
    Terminal(String),

    /// The attempt failed and the caller should offer to resubmit `payload` verbatim.
    #[error("delivery failed ({reason}); retry manually")]
    ManualRetryRequested { payload: String, reason: String },

    /// The circuit breaker is open; no request was sent.
    #[error("circuit open, try again in {}s", .remaining.as_secs().max(1))]
    CircuitOpen { remaining: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The four failure classes callers reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    Validation,
    Transient,
    Terminal,
    ManualRetryRequested,
}

impl CourierError {
    /// Classifies this error into the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CourierError::Validation(_) => ErrorKind::Validation,
            CourierError::Network { retryable: true, .. } => ErrorKind::Transient,
            CourierError::Http { status, .. } => match classify_status(*status) {
                StatusClass::Transient => ErrorKind::Transient,
                _ => ErrorKind::Terminal,
            },
            CourierError::ManualRetryRequested { .. } => ErrorKind::ManualRetryRequested,
            _ => ErrorKind::Terminal,
        }
    }

    /// Returns true when retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    pub(crate) fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        CourierError::Storage {
            source: Box::new(e),
        }
    }
}

impl From<serde_json::Error> for CourierError {
    fn from(e: serde_json::Error) -> Self {
        CourierError::Protocol(format!("malformed JSON: {e}"))
    }
}

impl From<std::io::Error> for CourierError {
    fn from(e: std::io::Error) -> Self {
        CourierError::storage(e)
    }
}
