//! Polling consumer for payment status updates.

use std::sync::Arc;
use std::time::Duration;

use domain::OrderService;
use tokio::sync::watch;

use crate::{MessageQueue, ReceivedMessage, decode_payment_update};

/// Polling parameters for [`PaymentStatusConsumer`].
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub queue_name: String,
    /// Maximum messages claimed per receive.
    pub batch_size: usize,
    /// How long one receive waits for messages.
    pub wait: Duration,
    /// Upper bound on handling a single message.
    pub handler_timeout: Duration,
    /// Pause after a failed receive.
    pub error_backoff: Duration,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            queue_name: "payment-status".to_string(),
            batch_size: 10,
            wait: Duration::from_secs(10),
            handler_timeout: Duration::from_secs(30),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// Applies payment status messages to orders.
///
/// Each message is decoded, handed to [`OrderService::update_payment_status`]
/// and then deleted whatever the outcome. Nothing is retried.
pub struct PaymentStatusConsumer {
    queue: Arc<dyn MessageQueue>,
    orders: OrderService,
    settings: ConsumerSettings,
}

impl PaymentStatusConsumer {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        orders: OrderService,
        settings: ConsumerSettings,
    ) -> Self {
        Self {
            queue,
            orders,
            settings,
        }
    }

    /// Polls until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// A message already being handled finishes before the loop exits.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(queue = %self.settings.queue_name, "payment status consumer started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let received = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                received = self.queue.receive(
                    &self.settings.queue_name,
                    self.settings.batch_size,
                    self.settings.wait,
                ) => received,
            };

            match received {
                Ok(messages) => {
                    for message in messages {
                        self.handle(message).await;
                    }
                }
                Err(error) => {
                    tracing::error!(%error, "failed to receive payment status messages");
                    tokio::select! {
                        _ = shutdown.changed() => {}
                        () = tokio::time::sleep(self.settings.error_backoff) => {}
                    }
                }
            }
        }

        tracing::info!("payment status consumer stopped");
    }

    /// Handles one message and deletes it.
    #[tracing::instrument(skip(self, message), fields(receive_count = message.receive_count))]
    pub async fn handle(&self, message: ReceivedMessage) {
        let outcome = self.apply(&message.body).await;
        metrics::counter!("queue_messages_consumed_total", "outcome" => outcome).increment(1);

        if let Err(error) = self
            .queue
            .delete(&self.settings.queue_name, &message.receipt)
            .await
        {
            tracing::warn!(%error, "failed to delete payment status message");
        }
    }

    async fn apply(&self, body: &str) -> &'static str {
        let update = match decode_payment_update(body) {
            Ok(update) => update,
            Err(error) => {
                metrics::counter!("queue_decode_errors_total").increment(1);
                tracing::warn!(%error, "dropping undecodable payment status message");
                return "malformed";
            }
        };

        tracing::debug!(
            event_type = %update.event_type,
            order_id = %update.order_id,
            payment_status = %update.payment_status,
            "payment status message received"
        );

        let result = tokio::time::timeout(
            self.settings.handler_timeout,
            self.orders
                .update_payment_status(update.order_id, &update.payment_status),
        )
        .await;

        match result {
            Ok(Ok(_)) => "applied",
            Ok(Err(error)) => {
                tracing::warn!(order_id = %update.order_id, %error, "payment status update rejected");
                "rejected"
            }
            Err(_) => {
                tracing::warn!(order_id = %update.order_id, "payment status update timed out");
                "timeout"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryQueue;

    #[test]
    fn test_default_settings() {
        let settings = ConsumerSettings::default();
        assert_eq!(settings.queue_name, "payment-status");
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.wait, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_malformed_message_is_deleted() {
        let queue = InMemoryQueue::new();
        let consumer = PaymentStatusConsumer::new(
            Arc::new(queue.clone()),
            OrderService::new(
                Arc::new(store::InMemoryOrderRepository::new()),
                Arc::new(crate::QueuePublisher::new(Arc::new(queue.clone()), "events")),
            ),
            ConsumerSettings::default(),
        );

        queue
            .send("payment-status", "{not json".to_string())
            .await
            .unwrap();
        let message = queue
            .receive("payment-status", 1, Duration::ZERO)
            .await
            .unwrap()
            .remove(0);

        consumer.handle(message).await;

        assert!(queue.is_empty("payment-status").await);
    }
}
