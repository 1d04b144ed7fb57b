//! Orders: entity, lifecycle states, and use cases.

mod entity;
mod service;
mod state;

pub use entity::{ESTIMATED_PREPARATION_TIME, Order, OrderRecord};
pub use service::OrderService;
pub use state::{OrderStatus, PaymentStatus};
