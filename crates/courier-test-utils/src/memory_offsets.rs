// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory offset store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{CourierError, OffsetStore};
use tokio::sync::Mutex;

/// [`OffsetStore`] backed by a shared `HashMap`. Clones share state, so a
/// clone handed to a second engine models a process relaunch over the same
/// durable store.
#[derive(Default, Clone)]
pub struct MemoryOffsetStore {
    offsets: Arc<Mutex<HashMap<String, u64>>>,
    saves: Arc<Mutex<Vec<(String, u64)>>>,
}

impl MemoryOffsetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `save` call, in order.
    pub async fn saves(&self) -> Vec<(String, u64)> {
        self.saves.lock().await.clone()
    }
}

#[async_trait]
impl OffsetStore for MemoryOffsetStore {
    async fn load(&self, session_id: &str) -> Result<Option<u64>, CourierError> {
        Ok(self.offsets.lock().await.get(session_id).copied())
    }

    async fn save(&self, session_id: &str, offset: u64) -> Result<(), CourierError> {
        self.offsets
            .lock()
            .await
            .insert(session_id.to_string(), offset);
        self.saves
            .lock()
            .await
            .push((session_id.to_string(), offset));
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), CourierError> {
        self.offsets.lock().await.remove(session_id);
        Ok(())
    }
}
