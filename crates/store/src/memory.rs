use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use domain::{
    Category, Order, OrderRecord, OrderRepository, OrderStatus, PaymentStatus, Product,
    ProductRepository, RepositoryError,
};
use tokio::sync::RwLock;

/// Rows keyed by ID plus the next ID to hand out.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    /// Reserves `preset` if given, otherwise the next sequential ID.
    fn reserve(&mut self, entity: &'static str, preset: Option<i64>) -> Result<i64, RepositoryError> {
        let id = match preset {
            Some(id) if self.rows.contains_key(&id) => {
                return Err(RepositoryError::Conflict { entity, id });
            }
            Some(id) => id,
            None => self.next_id,
        };
        self.next_id = self.next_id.max(id + 1);
        Ok(id)
    }
}

/// In-memory product repository for testing.
///
/// IDs are assigned sequentially starting at 1 and are never reused.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    table: Arc<RwLock<Table<Product>>>,
}

impl InMemoryProductRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored products.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Returns true if no products are stored.
    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn add(&self, product: &mut Product) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        let id = table.reserve("product", product.id().map(ProductId::as_i64))?;
        product.assign_id(ProductId::new(id));
        table.rows.insert(id, product.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.table
            .read()
            .await
            .rows
            .get(&id.as_i64())
            .cloned()
            .ok_or(RepositoryError::NotFound {
                entity: "product",
                id: id.as_i64(),
            })
    }

    async fn edit(&self, product: &Product) -> Result<(), RepositoryError> {
        let id = product
            .id()
            .ok_or_else(|| RepositoryError::infrastructure("edit product", "product has no id"))?;

        let mut table = self.table.write().await;
        let row = table
            .rows
            .get_mut(&id.as_i64())
            .ok_or(RepositoryError::NotFound {
                entity: "product",
                id: id.as_i64(),
            })?;
        *row = product.clone();
        Ok(())
    }

    async fn remove(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.table
            .write()
            .await
            .rows
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or(RepositoryError::NotFound {
                entity: "product",
                id: id.as_i64(),
            })
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn list_by_category(&self, category: Category) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|p| p.category() == category)
            .cloned()
            .collect())
    }
}

/// In-memory order repository for testing.
///
/// Orders are kept as records and rebuilt on every read, so callers never
/// share state with the stored copy.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    table: Arc<RwLock<Table<OrderRecord>>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Returns true if no orders are stored.
    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }

    async fn modify(
        &self,
        id: OrderId,
        apply: impl FnOnce(&mut OrderRecord),
    ) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        let record = table
            .rows
            .get_mut(&id.as_i64())
            .ok_or(RepositoryError::NotFound {
                entity: "order",
                id: id.as_i64(),
            })?;
        apply(record);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &mut Order) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        let id = table.reserve("order", order.id().map(OrderId::as_i64))?;
        order.assign_id(OrderId::new(id));

        let record = OrderRecord {
            id: OrderId::new(id),
            customer_name: order.customer_name().map(String::from),
            status: order.status(),
            payment_status: order.payment_status(),
            products: order.products().to_vec(),
            customization: order.customization().map(String::from),
            total: order.total(),
            estimated_time: order.estimated_time().to_string(),
            updated_at: order.updated_at(),
        };
        table.rows.insert(id, record);
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Order, RepositoryError> {
        self.table
            .read()
            .await
            .rows
            .get(&id.as_i64())
            .cloned()
            .map(Order::restore)
            .ok_or(RepositoryError::NotFound {
                entity: "order",
                id: id.as_i64(),
            })
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.modify(id, |record| {
            record.status = status;
            record.updated_at = updated_at;
        })
        .await
    }

    async fn update_payment_status(
        &self,
        id: OrderId,
        payment_status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.modify(id, |record| {
            record.payment_status = payment_status;
            record.updated_at = updated_at;
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .cloned()
            .map(Order::restore)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;

    fn product(name: &str, category: &str, cents: i64) -> Product {
        Product::new(name, category, "desc", Money::from_cents(cents)).unwrap()
    }

    #[tokio::test]
    async fn test_product_ids_are_sequential() {
        let repo = InMemoryProductRepository::new();

        let mut first = product("X-Burger", "Lanche", 2000);
        let mut second = product("Coca", "Bebida", 500);
        repo.add(&mut first).await.unwrap();
        repo.add(&mut second).await.unwrap();

        assert_eq!(first.id(), Some(ProductId::new(1)));
        assert_eq!(second.id(), Some(ProductId::new(2)));
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_removed_ids_are_not_reused() {
        let repo = InMemoryProductRepository::new();

        let mut first = product("X-Burger", "Lanche", 2000);
        repo.add(&mut first).await.unwrap();
        repo.remove(ProductId::new(1)).await.unwrap();

        let mut second = product("X-Salada", "Lanche", 2200);
        repo.add(&mut second).await.unwrap();
        assert_eq!(second.id(), Some(ProductId::new(2)));
    }

    #[tokio::test]
    async fn test_preset_id_conflict() {
        let repo = InMemoryProductRepository::new();

        let mut first = product("X-Burger", "Lanche", 2000).with_id(ProductId::new(7));
        repo.add(&mut first).await.unwrap();

        let mut duplicate = product("X-Salada", "Lanche", 2200).with_id(ProductId::new(7));
        let err = repo.add(&mut duplicate).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Conflict {
                entity: "product",
                id: 7
            }
        ));

        let mut next = product("Coca", "Bebida", 500);
        repo.add(&mut next).await.unwrap();
        assert_eq!(next.id(), Some(ProductId::new(8)));
    }

    #[tokio::test]
    async fn test_edit_and_remove_missing_product() {
        let repo = InMemoryProductRepository::new();
        let ghost = product("X-Burger", "Lanche", 2000).with_id(ProductId::new(99));

        assert!(repo.edit(&ghost).await.unwrap_err().is_not_found());
        assert!(repo.remove(ProductId::new(99)).await.unwrap_err().is_not_found());
        assert!(
            repo.find_by_id(ProductId::new(99))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let repo = InMemoryProductRepository::new();
        for (name, category) in [("A", "Lanche"), ("B", "Bebida"), ("C", "Lanche")] {
            repo.add(&mut product(name, category, 100)).await.unwrap();
        }

        let sandwiches = repo.list_by_category(Category::Lanche).await.unwrap();
        let names: Vec<_> = sandwiches.iter().map(Product::name).collect();
        assert_eq!(names, ["A", "C"]);

        assert!(
            repo.list_by_category(Category::Sobremesa)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_order_roundtrip_and_status_updates() {
        let repo = InMemoryOrderRepository::new();
        let burger = product("X-Burger", "Lanche", 2000).with_id(ProductId::new(1));
        let mut order = Order::new(Some("Ana".into()), vec![burger], None).unwrap();

        repo.create(&mut order).await.unwrap();
        let id = order.id().unwrap();
        assert_eq!(id, OrderId::new(1));

        let stored = repo.find_by_id(id).await.unwrap();
        assert_eq!(stored, order);

        let now = Utc::now();
        repo.update_status(id, OrderStatus::Pronto, now).await.unwrap();
        repo.update_payment_status(id, PaymentStatus::Pago, now)
            .await
            .unwrap();

        let stored = repo.find_by_id(id).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Pronto);
        assert_eq!(stored.payment_status(), PaymentStatus::Pago);
        assert_eq!(stored.updated_at(), now);
    }

    #[tokio::test]
    async fn test_missing_order() {
        let repo = InMemoryOrderRepository::new();
        let id = OrderId::new(42);

        assert!(repo.find_by_id(id).await.unwrap_err().is_not_found());
        assert!(
            repo.update_status(id, OrderStatus::Recebido, Utc::now())
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(repo.is_empty().await);
    }
}
