//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{Money, Product, ProductChanges};
use serde::{Deserialize, Serialize};

use super::{AppState, MessageResponse, parse_id};
use crate::error::ApiError;

// -- Request types --

/// Missing fields deserialize as empty so the domain reports which one is
/// required.
#[derive(Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
}

/// Omitted or empty fields keep the stored value.
#[derive(Deserialize, Default)]
pub struct EditProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Option<i64>,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id().map(ProductId::as_i64),
            name: product.name().to_string(),
            category: product.category().to_string(),
            description: product.description().to_string(),
            price: product.price().as_decimal(),
        }
    }
}

fn to_responses(products: &[Product]) -> Vec<ProductResponse> {
    products.iter().map(ProductResponse::from).collect()
}

/// Converts a wire price to cents.
///
/// Amounts that do not fit are rejected, as are non-zero amounts that round
/// to zero cents: on edit a zero price means "keep", so `0.004` must not
/// silently become one.
fn parse_price(amount: f64) -> Result<Money, ApiError> {
    let price = Money::try_from_decimal(amount)
        .ok_or_else(|| ApiError::BadRequest(format!("price out of range: {amount}")))?;
    if price.is_zero() && amount != 0.0 {
        return Err(ApiError::BadRequest(format!(
            "price must be at least one cent: {amount}"
        )));
    }
    Ok(price)
}

// -- Handlers --

/// POST /products: Register a new product.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state
        .product_service
        .create_product(
            &req.name,
            &req.category,
            &req.description,
            parse_price(req.price)?,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

/// GET /products: List the catalog.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.product_service.list_products().await?;
    Ok(Json(to_responses(&products)))
}

/// GET /products/{id}: Load one product.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state.product_service.find_product(id).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// PUT /products/{id}: Merge the given fields over the stored product.
#[tracing::instrument(skip(state, req))]
pub async fn edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<EditProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let changes = ProductChanges {
        name: req.name,
        category: req.category,
        description: req.description,
        price: parse_price(req.price)?,
    };

    let product = state.product_service.edit_product(id, changes).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// DELETE /products/{id}: Remove a product from the catalog.
#[tracing::instrument(skip(state))]
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    state.product_service.remove_product(id).await?;

    Ok(Json(MessageResponse {
        message: "product removed".to_string(),
        id: id.as_i64(),
    }))
}

/// GET /products/category/{category}: List products of one category.
#[tracing::instrument(skip(state))]
pub async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.product_service.list_by_category(&category).await?;
    Ok(Json(to_responses(&products)))
}
