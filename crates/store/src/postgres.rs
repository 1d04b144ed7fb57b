use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use domain::{
    Category, Money, Order, OrderRecord, OrderRepository, OrderStatus, PaymentStatus, Product,
    ProductRepository, RepositoryError,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

const UNIQUE_VIOLATION: &str = "23505";

/// Opens a connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| RepositoryError::infrastructure(operation, e)
}

fn not_found(entity: &'static str, id: i64) -> RepositoryError {
    RepositoryError::NotFound { entity, id }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

fn parse_category(operation: &'static str, raw: &str) -> Result<Category, RepositoryError> {
    raw.parse::<Category>()
        .map_err(|e| RepositoryError::infrastructure(operation, e))
}

/// PostgreSQL-backed product repository.
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_product(row: PgRow) -> Result<Product, RepositoryError> {
        let decode = |e: sqlx::Error| RepositoryError::infrastructure("decode product", e);
        let category: String = row.try_get("category").map_err(decode)?;

        Ok(Product::restore(
            ProductId::new(row.try_get("id").map_err(decode)?),
            row.try_get("name").map_err(decode)?,
            parse_category("decode product", &category)?,
            row.try_get("description").map_err(decode)?,
            Money::from_cents(row.try_get("price_cents").map_err(decode)?),
        ))
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn add(&self, product: &mut Product) -> Result<(), RepositoryError> {
        let query = match product.id() {
            Some(id) => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO products (id, name, category, description, price_cents)
                VALUES ($5, $1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(product.name())
            .bind(product.category().as_str())
            .bind(product.description())
            .bind(product.price().cents())
            .bind(id.as_i64()),
            None => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO products (name, category, description, price_cents)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(product.name())
            .bind(product.category().as_str())
            .bind(product.description())
            .bind(product.price().cents()),
        };

        let id = query.fetch_one(&self.pool).await.map_err(|e| {
            match product.id() {
                Some(id) if is_unique_violation(&e) => RepositoryError::Conflict {
                    entity: "product",
                    id: id.as_i64(),
                },
                _ => RepositoryError::infrastructure("add product", e),
            }
        })?;

        if product.id().is_some() {
            // Keep the sequence ahead of explicitly chosen IDs.
            sqlx::query(
                "SELECT setval(pg_get_serial_sequence('products', 'id'), (SELECT MAX(id) FROM products))",
            )
            .execute(&self.pool)
            .await
            .map_err(db_error("add product"))?;
        }

        product.assign_id(ProductId::new(id));
        tracing::debug!(product_id = id, "product inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, category, description, price_cents FROM products WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find product"))?
        .ok_or_else(|| not_found("product", id.as_i64()))?;

        Self::row_to_product(row)
    }

    async fn edit(&self, product: &Product) -> Result<(), RepositoryError> {
        let id = product
            .id()
            .ok_or_else(|| RepositoryError::infrastructure("edit product", "product has no id"))?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, category = $3, description = $4, price_cents = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .bind(product.name())
        .bind(product.category().as_str())
        .bind(product.description())
        .bind(product.price().cents())
        .execute(&self.pool)
        .await
        .map_err(db_error("edit product"))?;

        if result.rows_affected() == 0 {
            return Err(not_found("product", id.as_i64()));
        }
        Ok(())
    }

    async fn remove(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(db_error("remove product"))?;

        if result.rows_affected() == 0 {
            return Err(not_found("product", id.as_i64()));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, category, description, price_cents FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list products"))?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn list_by_category(&self, category: Category) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category, description, price_cents
            FROM products
            WHERE category = $1
            ORDER BY id
            "#,
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list products by category"))?;

        rows.into_iter().map(Self::row_to_product).collect()
    }
}

/// PostgreSQL-backed order repository.
///
/// Line items live in `order_items` as snapshots of the product taken when
/// the order was placed.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_record(row: &PgRow) -> Result<OrderRecord, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let payment_status: String = row.try_get("payment_status")?;

        Ok(OrderRecord {
            id: OrderId::new(row.try_get("id")?),
            customer_name: row.try_get("customer_name")?,
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            payment_status: payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            products: Vec::new(),
            customization: row.try_get("customization")?,
            total: Money::from_cents(row.try_get("total_cents")?),
            estimated_time: row.try_get("estimated_time")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_line_item(row: &PgRow) -> Result<(i64, Product), sqlx::Error> {
        let category: String = row.try_get("category")?;

        let product = Product::restore(
            ProductId::new(row.try_get("product_id")?),
            row.try_get("name")?,
            category
                .parse::<Category>()
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            row.try_get("description")?,
            Money::from_cents(row.try_get("price_cents")?),
        );
        Ok((row.try_get("order_id")?, product))
    }

    /// Loads line items for the given orders, grouped by order ID in
    /// placement order.
    async fn load_line_items(
        &self,
        order_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Product>>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, name, category, description, price_cents
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("load order items"))?;

        let mut items: HashMap<i64, Vec<Product>> = HashMap::new();
        for row in &rows {
            let (order_id, product) =
                Self::row_to_line_item(row).map_err(db_error("decode order item"))?;
            items.entry(order_id).or_default().push(product);
        }
        Ok(items)
    }

    async fn update_column(
        &self,
        operation: &'static str,
        sql: &'static str,
        id: OrderId,
        value: &'static str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(sql)
            .bind(id.as_i64())
            .bind(value)
            .bind(updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_error(operation))?;

        if result.rows_affected() == 0 {
            return Err(not_found("order", id.as_i64()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, order: &mut Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error("create order"))?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (customer_name, status, payment_status, customization, total_cents, estimated_time, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(order.customer_name())
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.customization())
        .bind(order.total().cents())
        .bind(order.estimated_time())
        .bind(order.updated_at())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("create order"))?;

        for (position, product) in order.products().iter().enumerate() {
            let product_id = product.id().ok_or_else(|| {
                RepositoryError::infrastructure("create order", "line item has no product id")
            })?;

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, name, category, description, price_cents)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(id)
            .bind(position as i32)
            .bind(product_id.as_i64())
            .bind(product.name())
            .bind(product.category().as_str())
            .bind(product.description())
            .bind(product.price().cents())
            .execute(&mut *tx)
            .await
            .map_err(db_error("create order item"))?;
        }

        tx.commit().await.map_err(db_error("create order"))?;

        order.assign_id(OrderId::new(id));
        tracing::debug!(order_id = id, items = order.products().len(), "order inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_name, status, payment_status, customization, total_cents, estimated_time, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find order"))?
        .ok_or_else(|| not_found("order", id.as_i64()))?;

        let mut record = Self::row_to_record(&row).map_err(db_error("decode order"))?;
        let mut items = self.load_line_items(&[id.as_i64()]).await?;
        record.products = items.remove(&id.as_i64()).unwrap_or_default();

        Ok(Order::restore(record))
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.update_column(
            "update order status",
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1",
            id,
            status.as_str(),
            updated_at,
        )
        .await
    }

    async fn update_payment_status(
        &self,
        id: OrderId,
        payment_status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.update_column(
            "update payment status",
            "UPDATE orders SET payment_status = $2, updated_at = $3 WHERE id = $1",
            id,
            payment_status.as_str(),
            updated_at,
        )
        .await
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_name, status, payment_status, customization, total_cents, estimated_time, updated_at
            FROM orders
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list orders"))?;

        let records = rows
            .iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error("decode order"))?;

        let ids: Vec<i64> = records.iter().map(|r| r.id.as_i64()).collect();
        let mut items = self.load_line_items(&ids).await?;

        Ok(records
            .into_iter()
            .map(|mut record| {
                record.products = items.remove(&record.id.as_i64()).unwrap_or_default();
                Order::restore(record)
            })
            .collect())
    }
}
