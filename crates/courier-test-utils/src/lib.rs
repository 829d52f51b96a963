// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides a scripted in-memory [`Transport`](courier_core::Transport) so the
//! delivery engines can be driven deterministically, including under a paused
//! tokio clock, without a remote service, plus an in-memory offset store.

pub mod memory_offsets;
pub mod mock_transport;

pub use memory_offsets::MemoryOffsetStore;
pub use mock_transport::{MockReply, MockTransport, RecordedCall, created_tweet};
