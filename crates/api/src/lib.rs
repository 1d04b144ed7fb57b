//! HTTP API server for the order management service.
//!
//! Provides REST endpoints for the product catalog and orders, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, put};
use domain::{EventPublisher, OrderRepository, OrderService, ProductRepository, ProductService};
use messaging::{InMemoryQueue, MessageQueue, PostgresQueue, QueuePublisher};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{
    InMemoryOrderRepository, InMemoryProductRepository, PostgresOrderRepository,
    PostgresProductRepository,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Failure while wiring the backends at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// The storage and queue adapters the services run on.
#[derive(Clone)]
pub struct Backends {
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub queue: Arc<dyn MessageQueue>,
}

impl Backends {
    /// Process-local backends. Nothing survives a restart, and each queue
    /// keeps at most `queue_capacity` messages.
    pub fn in_memory(queue_capacity: usize) -> Self {
        Self {
            orders: Arc::new(InMemoryOrderRepository::new()),
            products: Arc::new(InMemoryProductRepository::new()),
            queue: Arc::new(InMemoryQueue::new().with_capacity(queue_capacity)),
        }
    }

    /// PostgreSQL backends sharing one pool, with migrations applied.
    pub async fn postgres(database_url: &str, max_connections: u32) -> Result<Self, StartupError> {
        let pool = store::connect(database_url, max_connections).await?;
        store::run_migrations(&pool).await?;

        Ok(Self {
            orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
            products: Arc::new(PostgresProductRepository::new(pool.clone())),
            queue: Arc::new(PostgresQueue::new(pool)),
        })
    }

    /// Picks PostgreSQL when `DATABASE_URL` is configured, memory otherwise.
    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        match &config.database_url {
            Some(url) => {
                tracing::info!("using PostgreSQL backends");
                Self::postgres(url, config.database_max_connections).await
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory backends");
                Ok(Self::in_memory(config.memory_queue_capacity))
            }
        }
    }
}

/// Builds the use case services over `backends`, publishing events to
/// `events_queue`.
pub fn create_state(backends: &Backends, events_queue: &str) -> Arc<AppState> {
    let publisher: Arc<dyn EventPublisher> =
        Arc::new(QueuePublisher::new(backends.queue.clone(), events_queue));

    Arc::new(AppState {
        order_service: OrderService::new(backends.orders.clone(), publisher.clone()),
        product_service: ProductService::new(backends.products.clone(), publisher),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route(
            "/products/{id}",
            get(routes::products::get)
                .put(routes::products::edit)
                .delete(routes::products::remove),
        )
        .route(
            "/products/category/{category}",
            get(routes::products::list_by_category),
        )
        .route(
            "/orders",
            get(routes::orders::list).post(routes::orders::create),
        )
        .route("/orders/{id}", get(routes::orders::get))
        .route(
            "/orders/{id}/status/{status}",
            put(routes::orders::update_status),
        )
        .route(
            "/orders/{id}/payment/{payment_status}",
            put(routes::orders::update_payment_status),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
