//! Fixed product category set.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Category of a catalog product.
///
/// Parsing is exact and case-sensitive: `"lanche"` is not a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Sandwich or burger. Every order needs at least one.
    Lanche,

    /// Side dish.
    Acompanhamento,

    /// Drink.
    Bebida,

    /// Dessert.
    Sobremesa,
}

impl Category {
    /// All categories, in menu order.
    pub const ALL: [Category; 4] = [
        Category::Lanche,
        Category::Acompanhamento,
        Category::Bebida,
        Category::Sobremesa,
    ];

    /// Returns the category name as stored and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Lanche => "Lanche",
            Category::Acompanhamento => "Acompanhamento",
            Category::Bebida => "Bebida",
            Category::Sobremesa => "Sobremesa",
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidCategory(s.to_string()))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_category() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        for input in ["lanche", "LANCHE", "bebida", "Sobremesa ", "Pizza", ""] {
            let err = input.parse::<Category>().unwrap_err();
            assert_eq!(err, ValidationError::InvalidCategory(input.to_string()));
        }
    }

    #[test]
    fn test_serialization_uses_names() {
        let json = serde_json::to_string(&Category::Acompanhamento).unwrap();
        assert_eq!(json, "\"Acompanhamento\"");
    }
}
