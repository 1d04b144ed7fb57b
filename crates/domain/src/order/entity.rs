//! Order entity.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::product::Product;
use crate::value_objects::Money;

use super::{OrderStatus, PaymentStatus};

/// Preparation estimate shown to customers. Not derived from the products.
pub const ESTIMATED_PREPARATION_TIME: &str = "00:15:00";

/// A customer order.
///
/// Line items are full product snapshots taken when the order was placed,
/// one unit each. Editing a product later does not change existing orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: Option<OrderId>,
    customer_name: Option<String>,
    status: OrderStatus,
    payment_status: PaymentStatus,
    products: Vec<Product>,
    customization: Option<String>,
    total: Money,
    estimated_time: String,
    updated_at: DateTime<Utc>,
}

/// Stored representation of an order, used by backends to rebuild entities.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: OrderId,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub products: Vec<Product>,
    pub customization: Option<String>,
    pub total: Money,
    pub estimated_time: String,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Validates and builds a new pending order.
    ///
    /// Requires at least one product and at least one `Lanche`. The total is
    /// the sum of the product prices at this moment.
    pub fn new(
        customer_name: Option<String>,
        products: Vec<Product>,
        customization: Option<String>,
    ) -> Result<Self, ValidationError> {
        if products.is_empty() {
            return Err(ValidationError::NoProducts);
        }

        if !products.iter().any(Product::is_sandwich) {
            return Err(ValidationError::NoSandwich);
        }

        let total = products
            .iter()
            .try_fold(Money::zero(), |acc, p| acc.checked_add(p.price()))
            .ok_or(ValidationError::TotalOverflow)?;

        Ok(Self {
            id: None,
            customer_name: customer_name.filter(|name| !name.trim().is_empty()),
            status: OrderStatus::Pendente,
            payment_status: PaymentStatus::Pendente,
            products,
            customization,
            total,
            estimated_time: ESTIMATED_PREPARATION_TIME.to_string(),
            updated_at: Utc::now(),
        })
    }

    /// Rebuilds an order from storage without re-running validation.
    pub fn restore(record: OrderRecord) -> Self {
        Self {
            id: Some(record.id),
            customer_name: record.customer_name,
            status: record.status,
            payment_status: record.payment_status,
            products: record.products,
            customization: record.customization,
            total: record.total,
            estimated_time: record.estimated_time,
            updated_at: record.updated_at,
        }
    }

    /// Records the identity assigned by storage.
    pub fn assign_id(&mut self, id: OrderId) {
        self.id = Some(id);
    }

    /// Moves the order to `status` and refreshes the timestamp.
    ///
    /// On an unknown status the order is left untouched.
    pub fn update_status(&mut self, status: &str) -> Result<(), ValidationError> {
        let next = status.parse::<OrderStatus>()?;
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Sets the payment status and refreshes the timestamp.
    ///
    /// On an unknown payment status the order is left untouched.
    pub fn update_payment_status(&mut self, payment_status: &str) -> Result<(), ValidationError> {
        self.payment_status = payment_status.parse::<PaymentStatus>()?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Returns the line items.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn customization(&self) -> Option<&str> {
        self.customization.as_deref()
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn estimated_time(&self) -> &str {
        &self.estimated_time
    }

    /// Returns when the order was created or last changed status.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
