use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use crate::{MessageQueue, QueueError, ReceivedMessage, Result};

/// Default time a received message stays hidden before redelivery.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of messages kept per queue before the oldest is dropped.
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct StoredMessage {
    body: String,
    receipt: Option<String>,
    visible_at: Instant,
    receive_count: u32,
}

#[derive(Debug, Default)]
struct Queues {
    queues: HashMap<String, VecDeque<StoredMessage>>,
}

/// In-memory queue for tests and single-process runs.
///
/// Mirrors the visibility-timeout semantics of the PostgreSQL backend:
/// received messages are hidden until deleted or until the timeout expires.
///
/// Each queue holds at most `capacity` messages. Sending to a full queue
/// drops the oldest message, in flight or not, and counts it in
/// `queue_messages_dropped_total`.
#[derive(Clone)]
pub struct InMemoryQueue {
    state: Arc<Mutex<Queues>>,
    notify: Arc<Notify>,
    visibility_timeout: Duration,
    capacity: usize,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    /// Creates an empty queue set with the default visibility timeout.
    pub fn new() -> Self {
        Self::with_visibility_timeout(DEFAULT_VISIBILITY_TIMEOUT)
    }

    pub fn with_visibility_timeout(visibility_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(Queues::default())),
            notify: Arc::new(Notify::new()),
            visibility_timeout,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Caps every queue at `capacity` messages (at least one).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Returns the number of messages on `queue`, in flight or not.
    pub async fn len(&self, queue: &str) -> usize {
        self.state
            .lock()
            .await
            .queues
            .get(queue)
            .map_or(0, VecDeque::len)
    }

    /// Returns true if `queue` holds no messages.
    pub async fn is_empty(&self, queue: &str) -> bool {
        self.len(queue).await == 0
    }

    /// Returns the bodies on `queue` in send order without claiming them.
    pub async fn peek_all(&self, queue: &str) -> Vec<String> {
        self.state
            .lock()
            .await
            .queues
            .get(queue)
            .map(|messages| messages.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    async fn claim(&self, queue: &str, max_messages: usize) -> Vec<ReceivedMessage> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let Some(messages) = state.queues.get_mut(queue) else {
            return Vec::new();
        };

        messages
            .iter_mut()
            .filter(|m| m.visible_at <= now)
            .take(max_messages)
            .map(|m| {
                let receipt = Uuid::new_v4().to_string();
                m.receipt = Some(receipt.clone());
                m.visible_at = now + self.visibility_timeout;
                m.receive_count += 1;
                ReceivedMessage {
                    receipt,
                    body: m.body.clone(),
                    receive_count: m.receive_count,
                }
            })
            .collect()
    }

    /// Earliest instant at which a hidden message on `queue` becomes visible.
    async fn next_visible_at(&self, queue: &str) -> Option<Instant> {
        self.state
            .lock()
            .await
            .queues
            .get(queue)
            .and_then(|messages| messages.iter().map(|m| m.visible_at).min())
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send(&self, queue: &str, body: String) -> Result<()> {
        let mut state = self.state.lock().await;
        let messages = state.queues.entry(queue.to_string()).or_default();

        let mut dropped = 0u64;
        while messages.len() >= self.capacity {
            messages.pop_front();
            dropped += 1;
        }
        if dropped > 0 {
            metrics::counter!("queue_messages_dropped_total", "queue" => queue.to_string())
                .increment(dropped);
            tracing::warn!(
                queue,
                dropped,
                capacity = self.capacity,
                "queue full, dropped oldest message"
            );
        }

        messages.push_back(StoredMessage {
            body,
            receipt: None,
            visible_at: Instant::now(),
            receive_count: 0,
        });
        drop(state);

        self.notify.notify_waiters();
        Ok(())
    }

    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>> {
        if max_messages == 0 {
            return Ok(Vec::new());
        }
        let deadline = Instant::now() + wait;

        loop {
            // Register interest before checking so a send in between is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let claimed = self.claim(queue, max_messages).await;
            if !claimed.is_empty() || Instant::now() >= deadline {
                return Ok(claimed);
            }

            let wake_at = match self.next_visible_at(queue).await {
                Some(at) if at < deadline => at,
                _ => deadline,
            };

            tokio::select! {
                () = &mut notified => {}
                () = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn delete(&self, queue: &str, receipt: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let messages = state.queues.get_mut(queue);

        let position = messages
            .as_ref()
            .and_then(|m| m.iter().position(|m| m.receipt.as_deref() == Some(receipt)));

        match (messages, position) {
            (Some(messages), Some(index)) => {
                messages.remove(index);
                Ok(())
            }
            _ => Err(QueueError::ReceiptNotFound {
                queue: queue.to_string(),
                receipt: receipt.to_string(),
            }),
        }
    }
}
