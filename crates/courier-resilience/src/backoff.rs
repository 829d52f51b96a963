// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inter-attempt delay schedules. `attempt` is the 1-based number of the
//! attempt that just failed.

use std::time::Duration;

/// `min(cap, 2^(attempt - 1))` seconds.
pub fn exponential_delay(attempt: u32, cap: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(63);
    let secs = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(cap)
}

/// `attempt × unit`.
pub fn linear_delay(attempt: u32, unit: Duration) -> Duration {
    unit.saturating_mul(attempt)
}
