//! Catalog products.

mod category;
mod entity;
mod service;

pub use category::Category;
pub use entity::Product;
pub use service::{ProductChanges, ProductService};
