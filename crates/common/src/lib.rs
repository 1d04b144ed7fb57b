//! Shared types used across the order-management crates.

mod types;

pub use types::{OrderId, ProductId};
