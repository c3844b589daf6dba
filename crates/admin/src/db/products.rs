//! Product lookups for the variant editor.

use rust_decimal::Decimal;
use sqlx::PgPool;

use univendor_core::ProductId;

use super::RepositoryError;
use crate::models::ProductSummary;

#[derive(Debug, sqlx::FromRow)]
struct ProductSummaryRow {
    id: i32,
    name: String,
    sku: Option<String>,
    selling_price: Option<Decimal>,
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(row: ProductSummaryRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            sku: row.sku,
            selling_price: row.selling_price,
        }
    }
}

/// Repository for product reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the summary of a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_summary(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductSummaryRow>(
            r"
            SELECT id, name, sku, selling_price
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
