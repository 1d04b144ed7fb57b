//! Product entity.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::value_objects::Money;

use super::Category;

/// A sellable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Storage-assigned identity, `None` until persisted.
    id: Option<ProductId>,
    name: String,
    category: Category,
    description: String,
    price: Money,
}

impl Product {
    /// Validates and builds a product that has not been persisted yet.
    ///
    /// Name, category and description must be non-empty after trimming,
    /// price must be positive, and the category must be one of the fixed set.
    pub fn new(
        name: impl Into<String>,
        category: &str,
        description: impl Into<String>,
        price: Money,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let description = description.into();

        require("name", &name)?;
        require("category", category)?;
        require("description", &description)?;

        if !price.is_positive() {
            return Err(ValidationError::NonPositivePrice {
                cents: price.cents(),
            });
        }

        let category = category.parse::<Category>()?;

        Ok(Self {
            id: None,
            name,
            category,
            description,
            price,
        })
    }

    /// Rebuilds a product from storage without re-running validation.
    pub fn restore(
        id: ProductId,
        name: String,
        category: Category,
        description: String,
        price: Money,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            category,
            description,
            price,
        }
    }

    /// Records the identity assigned by storage.
    pub fn assign_id(&mut self, id: ProductId) {
        self.id = Some(id);
    }

    /// Returns the product with the given identity.
    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<ProductId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Money {
        self.price
    }

    /// Returns true if the product is a sandwich.
    pub fn is_sandwich(&self) -> bool {
        self.category == Category::Lanche
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_for_each_category() {
        let cases = [
            ("Big Mac", "Lanche", "Dois hambúrgueres", 2590),
            ("Coca Cola", "Bebida", "Refrigerante 350ml", 550),
            ("Batata Frita", "Acompanhamento", "Batata crocante", 800),
            ("Sundae", "Sobremesa", "Sorvete com calda", 1250),
        ];

        for (name, category, description, cents) in cases {
            let product = Product::new(name, category, description, Money::from_cents(cents))
                .unwrap();
            assert_eq!(product.id(), None);
            assert_eq!(product.name(), name);
            assert_eq!(product.category().as_str(), category);
            assert_eq!(product.description(), description);
            assert_eq!(product.price().cents(), cents);
        }
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        let price = Money::from_cents(1000);

        assert_eq!(
            Product::new("", "Lanche", "desc", price).unwrap_err(),
            ValidationError::EmptyField { field: "name" }
        );
        assert_eq!(
            Product::new("X-Burger", "", "desc", price).unwrap_err(),
            ValidationError::EmptyField { field: "category" }
        );
        assert_eq!(
            Product::new("X-Burger", "Lanche", "", price).unwrap_err(),
            ValidationError::EmptyField {
                field: "description"
            }
        );
    }

    #[test]
    fn test_whitespace_only_fields_count_as_empty() {
        let price = Money::from_cents(1000);

        assert_eq!(
            Product::new("   ", "Lanche", "desc", price).unwrap_err(),
            ValidationError::EmptyField { field: "name" }
        );
        assert_eq!(
            Product::new("X-Burger", "Lanche", "\t\n", price).unwrap_err(),
            ValidationError::EmptyField {
                field: "description"
            }
        );
    }

    #[test]
    fn test_non_positive_price_is_rejected() {
        for cents in [0, -1, -2590] {
            let err = Product::new("X-Burger", "Lanche", "desc", Money::from_cents(cents))
                .unwrap_err();
            assert_eq!(err, ValidationError::NonPositivePrice { cents });
        }
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        for category in ["lanche", "Bebidas", "Pizza"] {
            let err = Product::new("X-Burger", category, "desc", Money::from_cents(100))
                .unwrap_err();
            assert_eq!(err, ValidationError::InvalidCategory(category.to_string()));
        }
    }

    #[test]
    fn test_assign_id() {
        let mut product =
            Product::new("X-Burger", "Lanche", "desc", Money::from_cents(100)).unwrap();
        product.assign_id(ProductId::new(9));
        assert_eq!(product.id(), Some(ProductId::new(9)));
        assert!(product.is_sandwich());
    }
}
