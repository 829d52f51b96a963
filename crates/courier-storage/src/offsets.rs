// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed [`OffsetStore`].
//!
//! The whole session-to-offset map is one JSON object stored under
//! [`OFFSETS_KEY`] in the `kv` table. Every update is a read-modify-write
//! inside one transaction, so a crash loses at most that update.

use std::collections::BTreeMap;

use async_trait::async_trait;
use courier_core::{CourierError, OffsetStore};
use rusqlite::{OptionalExtension, Transaction, params};
use tracing::{debug, warn};

use crate::database::{Database, map_tr_err};

/// Well-known key holding the offset map.
pub const OFFSETS_KEY: &str = "courier.resumable.offsets";

type OffsetMap = BTreeMap<String, u64>;

/// Durable session-to-offset map for the resumable transfer manager.
#[derive(Clone)]
pub struct SqliteOffsetStore {
    db: Database,
}

impl SqliteOffsetStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns every persisted `(session_id, offset)` pair.
    pub async fn entries(&self) -> Result<Vec<(String, u64)>, CourierError> {
        let map = self
            .db
            .connection()
            .call(|conn| -> Result<OffsetMap, rusqlite::Error> {
                let tx = conn.transaction()?;
                let map = read_map(&tx)?;
                tx.commit()?;
                Ok(map)
            })
            .await
            .map_err(map_tr_err)?;
        Ok(map.into_iter().collect())
    }

    async fn update(
        &self,
        apply: impl FnOnce(&mut OffsetMap) + Send + 'static,
    ) -> Result<(), CourierError> {
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                let mut map = read_map(&tx)?;
                apply(&mut map);
                write_map(&tx, &map)?;
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }
}

fn read_map(tx: &Transaction<'_>) -> Result<OffsetMap, rusqlite::Error> {
    let raw: Option<String> = tx
        .query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![OFFSETS_KEY],
            |row| row.get(0),
        )
        .optional()?;

    Ok(match raw {
        Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable offset map");
            OffsetMap::new()
        }),
        None => OffsetMap::new(),
    })
}

fn write_map(tx: &Transaction<'_>, map: &OffsetMap) -> Result<(), rusqlite::Error> {
    let value = serde_json::to_string(map)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    tx.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
             value = excluded.value,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        params![OFFSETS_KEY, value],
    )?;
    Ok(())
}

#[async_trait]
impl OffsetStore for SqliteOffsetStore {
    async fn load(&self, session_id: &str) -> Result<Option<u64>, CourierError> {
        let session_id = session_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<u64>, rusqlite::Error> {
                let tx = conn.transaction()?;
                let offset = read_map(&tx)?.get(&session_id).copied();
                tx.commit()?;
                Ok(offset)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn save(&self, session_id: &str, offset: u64) -> Result<(), CourierError> {
        debug!(session_id, offset, "persisting offset");
        let key = session_id.to_string();
        self.update(move |map| {
            map.insert(key, offset);
        })
        .await
    }

    async fn clear(&self, session_id: &str) -> Result<(), CourierError> {
        let key = session_id.to_string();
        self.update(move |map| {
            map.remove(&key);
        })
        .await
    }
}
