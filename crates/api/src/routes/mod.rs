//! HTTP handlers and the state they share.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use std::str::FromStr;

use domain::{OrderService, ProductService};
use serde::Serialize;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub order_service: OrderService,
    pub product_service: ProductService,
}

/// Confirmation body for mutations that do not return an entity.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub id: i64,
}

/// Parses a path identifier before any use case runs.
fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse::<T>()
        .map_err(|_| ApiError::BadRequest(format!("invalid identifier: {raw}")))
}
