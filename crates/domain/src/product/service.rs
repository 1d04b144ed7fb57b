//! Product use cases.

use std::sync::Arc;

use common::ProductId;

use crate::error::DomainError;
use crate::events::{DomainEvent, publish_after_commit};
use crate::ports::{EventPublisher, ProductRepository, RepositoryError};
use crate::value_objects::Money;

use super::{Category, Product};

/// Replacement values for an edit.
///
/// An empty string or a zero price means "keep the stored value". There is no
/// way to blank a field through an edit.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: Money,
}

/// Catalog operations: create, edit, remove, find and list products.
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl ProductService {
    /// Creates a service bound to a repository and an event publisher.
    pub fn new(products: Arc<dyn ProductRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            products,
            publisher,
        }
    }

    /// Validates and stores a new product, then publishes `product_created`.
    #[tracing::instrument(skip(self, description))]
    pub async fn create_product(
        &self,
        name: &str,
        category: &str,
        description: &str,
        price: Money,
    ) -> Result<Product, DomainError> {
        let mut product = Product::new(name, category, description, price)?;

        self.products
            .add(&mut product)
            .await
            .map_err(DomainError::from_repository)?;

        metrics::counter!("products_created_total").increment(1);
        tracing::info!(product_id = ?product.id(), "product created");

        publish_after_commit(self.publisher.as_ref(), DomainEvent::product_created(&product))
            .await;

        Ok(product)
    }

    /// Merges `changes` over the stored product, re-validates the result and
    /// replaces it under the same ID, then publishes `product_edited`.
    #[tracing::instrument(skip(self, changes))]
    pub async fn edit_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, DomainError> {
        let current = self
            .products
            .find_by_id(id)
            .await
            .map_err(|e| not_found_as(e, id, DomainError::ProductNotRegistered))?;

        let name = keep_if_empty(changes.name, current.name());
        let category = keep_if_empty(changes.category, current.category().as_str());
        let description = keep_if_empty(changes.description, current.description());
        let price = if changes.price.is_zero() {
            current.price()
        } else {
            changes.price
        };

        let edited = Product::new(name, &category, description, price)?.with_id(id);

        self.products
            .edit(&edited)
            .await
            .map_err(|e| not_found_as(e, id, DomainError::ProductNotRegistered))?;

        tracing::info!(product_id = %id, "product edited");

        publish_after_commit(self.publisher.as_ref(), DomainEvent::product_edited(&edited))
            .await;

        Ok(edited)
    }

    /// Deletes an existing product, then publishes `product_removed`.
    #[tracing::instrument(skip(self))]
    pub async fn remove_product(&self, id: ProductId) -> Result<(), DomainError> {
        self.products
            .find_by_id(id)
            .await
            .map_err(|e| not_found_as(e, id, DomainError::ProductNotFound))?;

        self.products
            .remove(id)
            .await
            .map_err(|e| not_found_as(e, id, DomainError::ProductNotFound))?;

        tracing::info!(product_id = %id, "product removed");

        publish_after_commit(self.publisher.as_ref(), DomainEvent::product_removed(id)).await;

        Ok(())
    }

    /// Loads a product by ID.
    #[tracing::instrument(skip(self))]
    pub async fn find_product(&self, id: ProductId) -> Result<Product, DomainError> {
        self.products
            .find_by_id(id)
            .await
            .map_err(|e| not_found_as(e, id, DomainError::ProductNotFound))
    }

    /// Lists the whole catalog.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        self.products
            .list_all()
            .await
            .map_err(DomainError::from_repository)
    }

    /// Lists products whose category matches `category` exactly.
    ///
    /// No match yields an empty list. That includes strings that are not a
    /// category at all, such as `lanche`.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, DomainError> {
        let Ok(category) = category.parse::<Category>() else {
            tracing::debug!(category, "unknown category, nothing can match");
            return Ok(Vec::new());
        };

        self.products
            .list_by_category(category)
            .await
            .map_err(DomainError::from_repository)
    }
}

fn keep_if_empty(value: String, current: &str) -> String {
    if value.is_empty() {
        current.to_string()
    } else {
        value
    }
}

fn not_found_as(
    err: RepositoryError,
    id: ProductId,
    variant: fn(ProductId) -> DomainError,
) -> DomainError {
    if err.is_not_found() {
        variant(id)
    } else {
        DomainError::from_repository(err)
    }
}
