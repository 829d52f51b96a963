// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offset store trait for resumable transfers.

use async_trait::async_trait;

use crate::error::CourierError;

/// Durable map from transfer-session identifier to last confirmed byte offset.
///
/// Implementations must survive process restarts. Losing the most recent
/// update is acceptable; corrupting the other entries is not.
#[async_trait]
pub trait OffsetStore: Send + Sync + 'static {
    /// Returns the persisted offset for `session_id`, if any.
    async fn load(&self, session_id: &str) -> Result<Option<u64>, CourierError>;

    /// Persists `offset` for `session_id`, replacing any previous value.
    async fn save(&self, session_id: &str, offset: u64) -> Result<(), CourierError>;

    /// Forgets `session_id`. Clearing an unknown session is not an error.
    async fn clear(&self, session_id: &str) -> Result<(), CourierError>;
}
