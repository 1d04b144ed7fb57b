//! Domain error types.

use common::{OrderId, ProductId};
use thiserror::Error;

use crate::ports::RepositoryError;

/// An input violated an entity invariant.
///
/// Raised by entity constructors and mutators and propagated unchanged to
/// the caller. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field was empty or whitespace only.
    #[error("{field} is required")]
    EmptyField { field: &'static str },

    /// Price was zero or negative.
    #[error("price must be greater than zero (got {cents} cents)")]
    NonPositivePrice { cents: i64 },

    /// Category is not one of Lanche, Acompanhamento, Bebida, Sobremesa.
    #[error("invalid category: {0}")]
    InvalidCategory(String),

    /// Order was created without products.
    #[error("order must contain at least one product")]
    NoProducts,

    /// Order was created without a Lanche item.
    #[error("order must contain at least one sandwich (Lanche) item")]
    NoSandwich,

    /// The order total does not fit in the money range.
    #[error("order total is too large")]
    TotalOverflow,

    /// Order status string is not a known status.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Payment status string is not a known payment status.
    #[error("invalid payment status: {0}")]
    InvalidPaymentStatus(String),
}

/// Errors returned by the use-case services.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input failed a domain invariant.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The referenced product does not exist.
    #[error("Product does not exist: {0}")]
    ProductNotFound(ProductId),

    /// An edit targeted a product that was never created.
    #[error("Product {0} is not registered, create it first")]
    ProductNotRegistered(ProductId),

    /// An entity with the same identity already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The storage backend failed.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl DomainError {
    /// Returns true for any of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::OrderNotFound(_)
                | DomainError::ProductNotFound(_)
                | DomainError::ProductNotRegistered(_)
        )
    }

    /// Maps a repository failure that is not an expected not-found.
    pub(crate) fn from_repository(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { .. } => DomainError::Conflict(err.to_string()),
            other => DomainError::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_problem() {
        assert_eq!(
            ValidationError::NoProducts.to_string(),
            "order must contain at least one product"
        );
        assert!(ValidationError::NoSandwich.to_string().contains("sandwich"));
        assert_eq!(
            ValidationError::InvalidCategory("lanche".into()).to_string(),
            "invalid category: lanche"
        );
        assert_eq!(
            ValidationError::EmptyField { field: "name" }.to_string(),
            "name is required"
        );
    }

    #[test]
    fn not_found_variants_are_detected() {
        assert!(DomainError::OrderNotFound(OrderId::new(1)).is_not_found());
        assert!(DomainError::ProductNotFound(ProductId::new(1)).is_not_found());
        assert!(DomainError::ProductNotRegistered(ProductId::new(1)).is_not_found());
        assert!(!DomainError::from(ValidationError::NoProducts).is_not_found());
    }

    #[test]
    fn conflict_is_lifted_out_of_repository_errors() {
        let err = DomainError::from_repository(RepositoryError::Conflict {
            entity: "order",
            id: 3,
        });
        assert!(matches!(err, DomainError::Conflict(_)));

        let err = DomainError::from_repository(RepositoryError::infrastructure(
            "list orders",
            std::io::Error::other("connection reset"),
        ));
        assert!(matches!(err, DomainError::Repository(_)));
    }
}
