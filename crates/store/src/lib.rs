//! Repository backends for the order management service.
//!
//! - [`InMemoryOrderRepository`] / [`InMemoryProductRepository`] for tests and
//!   local runs without a database
//! - [`PostgresOrderRepository`] / [`PostgresProductRepository`] backed by sqlx

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryOrderRepository, InMemoryProductRepository};
pub use postgres::{PostgresOrderRepository, PostgresProductRepository, connect, run_migrations};
