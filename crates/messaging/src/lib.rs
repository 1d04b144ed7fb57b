//! Messaging adapters for the order management service.
//!
//! - [`MessageQueue`] with in-memory and PostgreSQL-table backends
//! - [`QueuePublisher`], the event publisher used by the use cases
//! - [`PaymentStatusConsumer`], the polling loop that applies payment updates

pub mod consumer;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod publisher;
pub mod queue;

pub use consumer::{ConsumerSettings, PaymentStatusConsumer};
pub use envelope::{DecodeError, Envelope, PaymentUpdate, decode_payment_update};
pub use error::{QueueError, Result};
pub use memory::{DEFAULT_CAPACITY, InMemoryQueue};
pub use postgres::PostgresQueue;
pub use publisher::QueuePublisher;
pub use queue::{MessageQueue, ReceivedMessage};
