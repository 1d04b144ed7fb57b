//! Message queue contract.

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// A message claimed by a consumer.
///
/// The message stays invisible to other consumers until it is deleted with
/// `receipt` or its visibility timeout expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub receipt: String,
    pub body: String,
    /// How many times the message has been handed out, this delivery included.
    pub receive_count: u32,
}

/// Named queues with receive/delete semantics.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Appends a message to `queue`.
    async fn send(&self, queue: &str, body: String) -> Result<()>;

    /// Claims up to `max_messages` visible messages, waiting up to `wait` for
    /// at least one to arrive. An empty vector means the wait elapsed.
    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>>;

    /// Removes a claimed message.
    async fn delete(&self, queue: &str, receipt: &str) -> Result<()>;
}
