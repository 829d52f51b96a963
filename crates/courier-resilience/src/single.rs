// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-attempt delivery: one request, failures logged and dropped.

use std::sync::Arc;

use async_trait::async_trait;
use courier_core::types::CreatedItem;
use courier_core::{
    ContentItem, CourierError, DeliveryPhase, DeliveryStatus, DeliveryStrategy, StatusReporter,
    StrategyKind, SubmitRequest, Submission, Transport, fetch_timeline,
};
use tokio::sync::watch;
use tracing::{info, warn};

/// Create-post endpoint of the single-attempt strategy.
pub const SINGLE_PATH: &str = "/level1/tweets";

/// The baseline client: exactly one attempt, never an error.
pub struct SingleShotDelivery {
    transport: Arc<dyn Transport>,
    status: StatusReporter,
}

impl SingleShotDelivery {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            status: StatusReporter::new(),
        }
    }

    /// Sends `text` once. Any failure is logged at `warn` and reported as
    /// [`Submission::Dropped`].
    pub async fn submit_text(&self, text: &str) -> Submission {
        self.status.begin(DeliveryPhase::Sending, "single attempt");
        let body = serde_json::json!({ "text": text });

        let result = match self.transport.post_json(SINGLE_PATH, &body).await {
            Ok(value) => serde_json::from_value::<CreatedItem>(value).map_err(CourierError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(created) => {
                info!(id = %created.tweet.id, "delivered in one attempt");
                self.status.finish(DeliveryPhase::Delivered, "delivered");
                Submission::Delivered(created.tweet)
            }
            Err(e) => {
                warn!(error = %e, "single-attempt delivery failed; dropping post");
                self.status.finish(DeliveryPhase::Failed, e.to_string());
                Submission::Dropped
            }
        }
    }
}

#[async_trait]
impl DeliveryStrategy for SingleShotDelivery {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Level1
    }

    async fn fetch(&self) -> Result<Vec<ContentItem>, CourierError> {
        fetch_timeline(self.transport.as_ref()).await
    }

    async fn submit(&self, request: SubmitRequest) -> Result<Submission, CourierError> {
        Ok(self.submit_text(&request.text).await)
    }

    fn status(&self) -> DeliveryStatus {
        self.status.snapshot()
    }

    fn subscribe(&self) -> watch::Receiver<DeliveryStatus> {
        self.status.subscribe()
    }
}
