//! Variant persistence against a migrated database.
//!
//! Each test seeds its own vendor and product.

#![allow(clippy::unwrap_used)]

use futures::future::join_all;
use sqlx::PgPool;
use uuid::Uuid;

use univendor_admin::db::VariantRepository;
use univendor_core::ProductId;
use univendor_integration_tests::{database_url, fields};

async fn seeded_product(pool: &PgPool) -> ProductId {
    let tag = Uuid::new_v4().simple().to_string();
    let vendor_id: i32 = sqlx::query_scalar(
        "INSERT INTO vendors (name, store_name, email) VALUES ($1, $1, $2) RETURNING id",
    )
    .bind(format!("vendor-{tag}"))
    .bind(format!("{tag}@example.com"))
    .fetch_one(pool)
    .await
    .unwrap();

    let product_id: i32 = sqlx::query_scalar(
        "INSERT INTO products (vendor_id, name, selling_price) VALUES ($1, 'Tee', 20) RETURNING id",
    )
    .bind(vendor_id)
    .fetch_one(pool)
    .await
    .unwrap();
    ProductId::new(product_id)
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_concurrent_creates_get_distinct_positions() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let product_id = seeded_product(&pool).await;
    let repo = VariantRepository::new(&pool);

    let batch: Vec<_> = ["Red", "Blue", "Green"]
        .iter()
        .flat_map(|color| ["S", "M"].map(|size| fields(color, size, 20)))
        .collect();
    let results = join_all(batch.iter().map(|f| repo.create(product_id, f))).await;
    assert!(results.iter().all(Result::is_ok));

    let mut positions: Vec<i32> = repo
        .list_for_product(product_id)
        .await
        .unwrap()
        .iter()
        .map(|v| v.position.unwrap())
        .collect();
    positions.sort_unstable();
    assert_eq!(positions, (0..6).collect::<Vec<_>>());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_create_for_missing_product_is_not_found() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let repo = VariantRepository::new(&pool);

    let err = repo
        .create(ProductId::new(i32::MAX), &fields("Red", "S", 20))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        univendor_admin::db::RepositoryError::NotFound
    ));
}
