// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delivery strategy façade exposed to the presentation layer.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::CourierError;
use crate::status::DeliveryStatus;
use crate::types::{ContentItem, StrategyKind, SubmitRequest, Submission};

/// Uniform capability implemented independently by each delivery engine.
///
/// Implementations carry no logic of their own beyond delegating to the
/// engine they wrap.
#[async_trait]
pub trait DeliveryStrategy: Send + Sync + 'static {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Fetches the current content list from the remote service.
    async fn fetch(&self) -> Result<Vec<ContentItem>, CourierError>;

    /// Submits new content.
    async fn submit(&self, request: SubmitRequest) -> Result<Submission, CourierError>;

    /// Returns the latest delivery status.
    fn status(&self) -> DeliveryStatus;

    /// Returns a receiver that observes status updates.
    fn subscribe(&self) -> watch::Receiver<DeliveryStatus>;
}
