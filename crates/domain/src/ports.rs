//! Storage and notification contracts consumed by the use-case services.
//!
//! Concrete backends live in the `store` and `messaging` crates and are
//! selected when the process is wired together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use thiserror::Error;

use crate::order::{Order, OrderStatus, PaymentStatus};
use crate::product::{Category, Product};

/// Boxed error used to carry driver-specific failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No record matches the identity.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A record with the same identity already exists.
    #[error("{entity} {id} already exists")]
    Conflict { entity: &'static str, id: i64 },

    /// The backend failed while running `operation`.
    #[error("{operation} failed: {source}")]
    Infrastructure {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl RepositoryError {
    /// Wraps a backend failure with the name of the operation that failed.
    pub fn infrastructure(operation: &'static str, source: impl Into<BoxError>) -> Self {
        RepositoryError::Infrastructure {
            operation,
            source: source.into(),
        }
    }

    /// Returns true if no record matched.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Persistence contract for orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order and its line items, assigning the generated ID
    /// on `order`.
    async fn create(&self, order: &mut Order) -> Result<(), RepositoryError>;

    /// Loads an order with its line items.
    async fn find_by_id(&self, id: OrderId) -> Result<Order, RepositoryError>;

    /// Overwrites the preparation status and last-updated timestamp.
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Overwrites the payment status and last-updated timestamp.
    async fn update_payment_status(
        &self,
        id: OrderId,
        payment_status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Loads every order.
    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError>;
}

/// Persistence contract for catalog products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persists a new product, assigning the generated ID on `product`.
    async fn add(&self, product: &mut Product) -> Result<(), RepositoryError>;

    /// Loads a product by ID.
    async fn find_by_id(&self, id: ProductId) -> Result<Product, RepositoryError>;

    /// Replaces every mutable field of the product with the same ID.
    async fn edit(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Deletes a product.
    async fn remove(&self, id: ProductId) -> Result<(), RepositoryError>;

    /// Loads every product.
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Loads products whose category matches exactly. No match is an empty
    /// list, not an error.
    async fn list_by_category(&self, category: Category) -> Result<Vec<Product>, RepositoryError>;
}

/// Errors reported by event publishers.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport rejected or failed to deliver the message.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Outbound channel for named domain events.
///
/// Publication is best-effort: callers log failures and carry on.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Emits `payload` under the given event type.
    async fn publish(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), PublishError>;
}
