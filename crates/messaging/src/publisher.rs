//! Event publisher that writes envelopes to a queue.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{EventPublisher, PublishError};

use crate::{Envelope, MessageQueue};

/// Publishes domain events as `{event_type, data}` JSON envelopes onto one
/// queue.
#[derive(Clone)]
pub struct QueuePublisher {
    queue: Arc<dyn MessageQueue>,
    queue_name: String,
}

impl QueuePublisher {
    pub fn new(queue: Arc<dyn MessageQueue>, queue_name: impl Into<String>) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
        }
    }

    /// Returns the destination queue name.
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }
}

#[async_trait]
impl EventPublisher for QueuePublisher {
    #[tracing::instrument(skip(self, payload), fields(queue = %self.queue_name))]
    async fn publish(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), PublishError> {
        let body = serde_json::to_string(&Envelope {
            event_type: event_type.to_string(),
            data: payload,
        })?;

        self.queue
            .send(&self.queue_name, body)
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))
    }
}
