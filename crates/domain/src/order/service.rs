//! Order use cases.

use std::sync::Arc;

use common::OrderId;

use crate::error::DomainError;
use crate::events::{DomainEvent, publish_after_commit};
use crate::ports::{EventPublisher, OrderRepository, RepositoryError};
use crate::product::Product;

use super::Order;

/// Order operations: place, fetch, list and move through the lifecycle.
///
/// Stateless apart from its ports, so it can be cloned into every handler
/// and called concurrently. Concurrent status writes to one order are
/// last-write-wins.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderService {
    /// Creates a service bound to a repository and an event publisher.
    pub fn new(orders: Arc<dyn OrderRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { orders, publisher }
    }

    /// Validates and stores a new order, then publishes `order_created`.
    ///
    /// `products` must be the full stored products; their prices at this
    /// moment make up the total.
    #[tracing::instrument(skip(self, products, customization), fields(product_count = products.len()))]
    pub async fn create_order(
        &self,
        customer_name: Option<String>,
        products: Vec<Product>,
        customization: Option<String>,
    ) -> Result<Order, DomainError> {
        let mut order = Order::new(customer_name, products, customization)?;

        self.orders
            .create(&mut order)
            .await
            .map_err(DomainError::from_repository)?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = ?order.id(), total = %order.total(), "order created");

        publish_after_commit(self.publisher.as_ref(), DomainEvent::order_created(&order)).await;

        Ok(order)
    }

    /// Loads an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.orders
            .find_by_id(id)
            .await
            .map_err(|e| order_error(e, id))
    }

    /// Lists every order.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.orders
            .list_all()
            .await
            .map_err(DomainError::from_repository)
    }

    /// Moves an order to a new preparation status, then publishes
    /// `order_status_updated`.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order, DomainError> {
        let mut order = self.get_order(id).await?;

        order.update_status(status)?;

        self.orders
            .update_status(id, order.status(), order.updated_at())
            .await
            .map_err(|e| order_error(e, id))?;

        metrics::counter!("order_status_updates_total", "status" => order.status().as_str())
            .increment(1);
        tracing::info!(order_id = %id, status = %order.status(), "order status updated");

        publish_after_commit(
            self.publisher.as_ref(),
            DomainEvent::order_status_updated(&order),
        )
        .await;

        Ok(order)
    }

    /// Sets the payment status of an order. No event is published.
    #[tracing::instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        id: OrderId,
        payment_status: &str,
    ) -> Result<Order, DomainError> {
        let mut order = self.get_order(id).await?;

        order.update_payment_status(payment_status)?;

        self.orders
            .update_payment_status(id, order.payment_status(), order.updated_at())
            .await
            .map_err(|e| order_error(e, id))?;

        metrics::counter!(
            "payment_status_updates_total",
            "payment_status" => order.payment_status().as_str()
        )
        .increment(1);
        tracing::info!(
            order_id = %id,
            payment_status = %order.payment_status(),
            "payment status updated"
        );

        Ok(order)
    }
}

fn order_error(err: RepositoryError, id: OrderId) -> DomainError {
    if err.is_not_found() {
        DomainError::OrderNotFound(id)
    } else {
        DomainError::from_repository(err)
    }
}
