// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-size slicing of the local payload.

use std::io::SeekFrom;
use std::path::Path;

use courier_core::CourierError;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// One slice of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

/// Reads the payload in `chunk_size` slices from an arbitrary offset.
pub struct ChunkReader {
    file: File,
    chunk_size: usize,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path`. A missing or empty payload is a validation error.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, CourierError> {
        let file = File::open(path).await.map_err(|e| {
            CourierError::Validation(format!("cannot open media {}: {e}", path.display()))
        })?;
        let file_size = file.metadata().await?.len();
        if file_size == 0 {
            return Err(CourierError::Validation(format!(
                "media {} is empty",
                path.display()
            )));
        }
        Ok(Self {
            file,
            chunk_size: chunk_size.max(1),
            file_size,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Reads the chunk starting at `offset`; the last one may be short.
    /// Returns `None` at or past the end.
    pub async fn chunk_at(&mut self, offset: u64) -> Result<Option<Chunk>, CourierError> {
        let remaining = self.file_size.saturating_sub(offset);
        if remaining == 0 {
            return Ok(None);
        }
        let len = remaining.min(self.chunk_size as u64) as usize;

        self.file.seek(SeekFrom::Start(offset)).await?;
        let mut data = vec![0u8; len];
        self.file.read_exact(&mut data).await?;
        Ok(Some(Chunk { offset, data }))
    }
}
