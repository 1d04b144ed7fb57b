//! Domain layer for the order management service.
//!
//! This crate provides:
//! - Product and Order entities with their validation rules
//! - Repository and event publisher ports implemented by outer crates
//! - `ProductService` and `OrderService` use cases
//! - Domain events published after successful writes

pub mod error;
pub mod events;
pub mod order;
pub mod ports;
pub mod product;
pub mod value_objects;

pub use common::{OrderId, ProductId};
pub use error::{DomainError, ValidationError};
pub use events::DomainEvent;
pub use order::{
    ESTIMATED_PREPARATION_TIME, Order, OrderRecord, OrderService, OrderStatus, PaymentStatus,
};
pub use ports::{
    BoxError, EventPublisher, OrderRepository, ProductRepository, PublishError, RepositoryError,
};
pub use product::{Category, Product, ProductChanges, ProductService};
pub use value_objects::Money;
