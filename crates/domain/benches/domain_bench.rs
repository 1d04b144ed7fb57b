use std::sync::Arc;

use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    EventPublisher, Money, Order, OrderService, Product, ProductId, ProductService, PublishError,
};
use store::{InMemoryOrderRepository, InMemoryProductRepository};

struct DiscardPublisher;

#[async_trait]
impl EventPublisher for DiscardPublisher {
    async fn publish(&self, _: &str, _: serde_json::Value) -> Result<(), PublishError> {
        Ok(())
    }
}

fn menu(size: i64) -> Vec<Product> {
    (1..=size)
        .map(|i| {
            let category = if i % 2 == 0 { "Lanche" } else { "Bebida" };
            Product::new(
                format!("Item {i}"),
                category,
                "benchmark item",
                Money::from_cents(100 * i),
            )
            .unwrap()
            .with_id(ProductId::new(i))
        })
        .collect()
}

fn order_service() -> OrderService {
    OrderService::new(
        Arc::new(InMemoryOrderRepository::new()),
        Arc::new(DiscardPublisher),
    )
}

fn bench_order_validation(c: &mut Criterion) {
    let products = menu(50);

    c.bench_function("domain/order_new_50_items", |b| {
        b.iter(|| Order::new(Some("bench".into()), products.clone(), None).unwrap());
    });
}

fn bench_create_product(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = ProductService::new(
        Arc::new(InMemoryProductRepository::new()),
        Arc::new(DiscardPublisher),
    );

    c.bench_function("domain/create_product", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .create_product("X-Burger", "Lanche", "pão, carne, queijo", Money::from_cents(2590))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = order_service();
    let products = menu(4);

    c.bench_function("domain/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .create_order(Some("bench".into()), products.clone(), None)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_status_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = order_service();
    let order_id = rt.block_on(async {
        service
            .create_order(None, menu(2), None)
            .await
            .unwrap()
            .id()
            .unwrap()
    });

    c.bench_function("domain/full_status_cycle", |b| {
        b.iter(|| {
            rt.block_on(async {
                for status in ["Recebido", "EmPreparacao", "Pronto", "Finalizado"] {
                    service.update_status(order_id, status).await.unwrap();
                }
                service.update_payment_status(order_id, "Pago").await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_order_validation,
    bench_create_product,
    bench_create_order,
    bench_status_cycle,
);
criterion_main!(benches);
