// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery status publishing.
//!
//! Each engine owns one [`StatusReporter`]. Observers either take a snapshot
//! or subscribe to a `watch` channel that always holds the latest status.

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;

/// Coarse phase of the engine's current (or last) submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryPhase {
    Idle,
    Sending,
    /// Waiting before the next attempt.
    Backoff,
    Uploading,
    Finalizing,
    Delivered,
    Failed,
    /// Jobs are persisted and being drained in the background.
    Draining,
}

/// Point-in-time status of one engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryStatus {
    pub phase: DeliveryPhase,
    /// Fraction in `[0.0, 1.0]`. Attempts consumed for the retry engine,
    /// confirmed bytes for the resumable manager.
    pub progress: f64,
    pub detail: String,
    /// Jobs not yet delivered (durable queue only).
    pub outstanding: usize,
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        Self {
            phase: DeliveryPhase::Idle,
            progress: 0.0,
            detail: String::new(),
            outstanding: 0,
        }
    }
}

/// Publishes [`DeliveryStatus`] updates for one engine instance.
#[derive(Debug)]
pub struct StatusReporter {
    tx: watch::Sender<DeliveryStatus>,
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DeliveryStatus::default());
        Self { tx }
    }

    /// Returns the latest status.
    pub fn snapshot(&self) -> DeliveryStatus {
        self.tx.borrow().clone()
    }

    /// Returns a receiver that observes every subsequent update.
    pub fn subscribe(&self) -> watch::Receiver<DeliveryStatus> {
        self.tx.subscribe()
    }

    /// Starts a new submission: phase set, progress reset.
    pub fn begin(&self, phase: DeliveryPhase, detail: impl Into<String>) {
        let detail = detail.into();
        self.tx.send_modify(|s| {
            s.phase = phase;
            s.progress = 0.0;
            s.detail = detail;
        });
    }

    pub fn phase(&self, phase: DeliveryPhase, detail: impl Into<String>) {
        let detail = detail.into();
        self.tx.send_modify(|s| {
            s.phase = phase;
            s.detail = detail;
        });
    }

    /// Sets progress, clamped to `[0.0, 1.0]`.
    pub fn progress(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.tx.send_modify(|s| s.progress = fraction);
    }

    /// Raises progress to `fraction`; lower values are ignored.
    pub fn advance(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.tx.send_if_modified(|s| {
            if fraction > s.progress {
                s.progress = fraction;
                true
            } else {
                false
            }
        });
    }

    pub fn outstanding(&self, count: usize) {
        self.tx.send_if_modified(|s| {
            if s.outstanding != count {
                s.outstanding = count;
                true
            } else {
                false
            }
        });
    }

    /// Marks the submission finished.
    pub fn finish(&self, phase: DeliveryPhase, detail: impl Into<String>) {
        let detail = detail.into();
        self.tx.send_modify(|s| {
            if phase == DeliveryPhase::Delivered {
                s.progress = 1.0;
            }
            s.phase = phase;
            s.detail = detail;
        });
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}
