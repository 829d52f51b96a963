// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submission-level circuit breaker.
//!
//! Counts consecutive *submissions* that exhausted their attempt cap, not
//! individual attempts. State lives in memory only; a restart closes it.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

/// Consecutive-failure counter with an optional open window.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            consecutive_failures: 0,
            open_until: None,
        }
    }

    /// Returns `Err(remaining)` while the breaker is open at `now`.
    ///
    /// An elapsed window closes the breaker.
    pub fn check(&mut self, now: Instant) -> Result<(), Duration> {
        match self.open_until {
            Some(until) if now < until => Err(until - now),
            Some(_) => {
                info!("circuit closed");
                self.open_until = None;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// A submission succeeded.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// A submission exhausted its attempts. Returns true if this opened the
    /// breaker; opening resets the counter.
    pub fn record_exhausted(&mut self, now: Instant) -> bool {
        self.consecutive_failures += 1;
        if self.consecutive_failures < self.threshold {
            return false;
        }
        warn!(
            failures = self.consecutive_failures,
            cooldown_secs = self.cooldown.as_secs(),
            "circuit opened"
        );
        self.consecutive_failures = 0;
        self.open_until = Some(now + self.cooldown);
        true
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_open(&self, now: Instant) -> bool {
        self.open_until.is_some_and(|until| now < until)
    }
}
