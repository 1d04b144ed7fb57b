//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use domain::Order;
use serde::{Deserialize, Serialize};

use super::products::ProductResponse;
use super::{AppState, MessageResponse, parse_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: Option<String>,
    #[serde(default)]
    pub products: Vec<i64>,
    pub customization: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Option<i64>,
    pub customer_name: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub products: Vec<ProductResponse>,
    pub customization: Option<String>,
    pub total: f64,
    pub estimated_time: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().map(OrderId::as_i64),
            customer_name: order.customer_name().map(String::from),
            status: order.status().to_string(),
            payment_status: order.payment_status().to_string(),
            products: order.products().iter().map(ProductResponse::from).collect(),
            customization: order.customization().map(String::from),
            total: order.total().as_decimal(),
            estimated_time: order.estimated_time().to_string(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /orders: Place an order for stored products.
///
/// Each product ID is resolved first, so the order keeps the product as it
/// is at this moment.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let mut products = Vec::with_capacity(req.products.len());
    for id in req.products {
        products.push(
            state
                .product_service
                .find_product(ProductId::new(id))
                .await?,
        );
    }

    let order = state
        .order_service
        .create_order(req.customer_name, products, req.customization)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders: List every order.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.order_service.list_orders().await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}: Load one order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state.order_service.get_order(id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /orders/{id}/status/{status}: Move an order to a new status.
#[tracing::instrument(skip(state))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path((id, status)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state.order_service.update_status(id, &status).await?;

    Ok(Json(MessageResponse {
        message: format!("order status updated to {}", order.status()),
        id: id.as_i64(),
    }))
}

/// PUT /orders/{id}/payment/{payment_status}: Set the payment status.
#[tracing::instrument(skip(state))]
pub async fn update_payment_status(
    State(state): State<Arc<AppState>>,
    Path((id, payment_status)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state
        .order_service
        .update_payment_status(id, &payment_status)
        .await?;

    Ok(Json(MessageResponse {
        message: format!("payment status updated to {}", order.payment_status()),
        id: id.as_i64(),
    }))
}
