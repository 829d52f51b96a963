// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resumable chunked delivery for Courier.
//!
//! [`TransferBridge`] turns per-chunk background transfer events into one
//! awaited result per chunk and owns staged-file cleanup.
//! [`ResumableUploader`] drives the session protocol on top of it.

pub mod bridge;
pub mod chunks;
pub mod manager;
pub mod session;

pub use bridge::{BackgroundSession, ChunkRequest, ChunkResult, TransferBridge, TransferEvent};
pub use chunks::{Chunk, ChunkReader};
pub use manager::{ResumableUploader, START_PATH, UPLOAD_LENGTH_HEADER, UPLOAD_OFFSET_HEADER};
pub use session::TransportSession;
