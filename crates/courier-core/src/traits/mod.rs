// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the delivery engines and their collaborators.
//!
//! All async traits use `#[async_trait]` so they can be held as trait objects.

pub mod offsets;
pub mod strategy;
pub mod transport;

pub use offsets::OffsetStore;
pub use strategy::DeliveryStrategy;
pub use transport::{Headers, Transport, fetch_timeline};
