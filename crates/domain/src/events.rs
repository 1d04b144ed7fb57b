//! Domain events emitted after successful writes.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::Serialize;

use crate::order::{Order, OrderStatus, PaymentStatus};
use crate::ports::{EventPublisher, PublishError};
use crate::product::{Category, Product};

/// Events published by the use-case services.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    OrderCreated(OrderCreatedData),
    OrderStatusUpdated(OrderStatusUpdatedData),
    ProductCreated(ProductData),
    ProductEdited(ProductData),
    ProductRemoved(ProductRemovedData),
}

impl DomainEvent {
    /// Returns the event type name used on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::OrderCreated(_) => "order_created",
            DomainEvent::OrderStatusUpdated(_) => "order_status_updated",
            DomainEvent::ProductCreated(_) => "product_created",
            DomainEvent::ProductEdited(_) => "product_edited",
            DomainEvent::ProductRemoved(_) => "product_removed",
        }
    }

    /// Encodes the event data as a JSON object.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            DomainEvent::OrderCreated(data) => serde_json::to_value(data),
            DomainEvent::OrderStatusUpdated(data) => serde_json::to_value(data),
            DomainEvent::ProductCreated(data) | DomainEvent::ProductEdited(data) => {
                serde_json::to_value(data)
            }
            DomainEvent::ProductRemoved(data) => serde_json::to_value(data),
        }
    }

    pub fn order_created(order: &Order) -> Self {
        DomainEvent::OrderCreated(OrderCreatedData {
            order_id: order.id(),
            customer_name: order.customer_name().map(String::from),
            status: order.status(),
            payment_status: order.payment_status(),
            customization: order.customization().map(String::from),
            total: order.total().as_decimal(),
            created_at: order.updated_at(),
            products: order
                .products()
                .iter()
                .map(|p| OrderLineData {
                    id: p.id(),
                    name: p.name().to_string(),
                    price: p.price().as_decimal(),
                })
                .collect(),
        })
    }

    pub fn order_status_updated(order: &Order) -> Self {
        DomainEvent::OrderStatusUpdated(OrderStatusUpdatedData {
            order_id: order.id(),
            status: order.status(),
            updated_at: order.updated_at(),
        })
    }

    pub fn product_created(product: &Product) -> Self {
        DomainEvent::ProductCreated(ProductData::from(product))
    }

    pub fn product_edited(product: &Product) -> Self {
        DomainEvent::ProductEdited(ProductData::from(product))
    }

    pub fn product_removed(product_id: ProductId) -> Self {
        DomainEvent::ProductRemoved(ProductRemovedData { product_id })
    }
}

/// Data for `order_created`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreatedData {
    pub order_id: Option<OrderId>,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub customization: Option<String>,
    pub total: f64,
    pub created_at: DateTime<Utc>,
    pub products: Vec<OrderLineData>,
}

/// A line item inside `order_created`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineData {
    pub id: Option<ProductId>,
    pub name: String,
    pub price: f64,
}

/// Data for `order_status_updated`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusUpdatedData {
    pub order_id: Option<OrderId>,
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

/// Data for `product_created` and `product_edited`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductData {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub price: f64,
}

impl From<&Product> for ProductData {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id(),
            name: product.name().to_string(),
            category: product.category(),
            description: product.description().to_string(),
            price: product.price().as_decimal(),
        }
    }
}

/// Data for `product_removed`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRemovedData {
    pub product_id: ProductId,
}

/// Publishes an event after its write has committed.
///
/// Failures are logged and counted, never returned: the business operation
/// already succeeded and is not rolled back.
pub(crate) async fn publish_after_commit(publisher: &dyn EventPublisher, event: DomainEvent) {
    let event_type = event.event_type();

    let result = match event.payload() {
        Ok(payload) => publisher.publish(event_type, payload).await,
        Err(e) => Err(PublishError::from(e)),
    };

    match result {
        Ok(()) => {
            metrics::counter!("events_published_total", "event_type" => event_type).increment(1);
            tracing::debug!(event_type, "event published");
        }
        Err(error) => {
            metrics::counter!("event_publish_failures_total", "event_type" => event_type)
                .increment(1);
            tracing::warn!(event_type, %error, "failed to publish event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Money;

    fn burger() -> Product {
        Product::new("Big Mac", "Lanche", "Dois hambúrgueres", Money::from_cents(2500))
            .unwrap()
            .with_id(ProductId::new(1))
    }

    #[test]
    fn test_event_type_names() {
        let product = burger();
        assert_eq!(
            DomainEvent::product_created(&product).event_type(),
            "product_created"
        );
        assert_eq!(
            DomainEvent::product_edited(&product).event_type(),
            "product_edited"
        );
        assert_eq!(
            DomainEvent::product_removed(ProductId::new(1)).event_type(),
            "product_removed"
        );
    }

    #[test]
    fn test_order_created_payload_lists_products() {
        let mut order = Order::new(Some("João".into()), vec![burger()], None).unwrap();
        order.assign_id(OrderId::new(5));

        let event = DomainEvent::order_created(&order);
        assert_eq!(event.event_type(), "order_created");

        let payload = event.payload().unwrap();
        assert_eq!(payload["order_id"], 5);
        assert_eq!(payload["customer_name"], "João");
        assert_eq!(payload["status"], "Pendente");
        assert_eq!(payload["total"], 25.0);
        assert_eq!(payload["products"][0]["name"], "Big Mac");
    }

    #[test]
    fn test_product_payload_uses_decimal_price() {
        let payload = DomainEvent::product_edited(&burger()).payload().unwrap();
        assert_eq!(payload["product_id"], 1);
        assert_eq!(payload["category"], "Lanche");
        assert_eq!(payload["price"], 25.0);
    }
}
