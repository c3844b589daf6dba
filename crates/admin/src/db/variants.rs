//! Product variant repository.
//!
//! Writes that mark a variant as the default clear the flag on the product's
//! other variants inside the same transaction, so a product never has two
//! defaults (also enforced by the `idx_product_variants_one_default` index).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use univendor_core::{ProductId, VariantFields, VariantId};

use super::RepositoryError;
use crate::models::ProductVariant;
use crate::variants::VariantStore;

macro_rules! variant_columns {
    () => {
        r"id, product_id, color, size, attributes, sku, barcode,
          purchase_price, selling_price, mrp, gst, inventory_quantity, weight,
          image_url, images, position, is_default, created_at, updated_at"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `product_variants` queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductVariantRow {
    id: i32,
    product_id: i32,
    color: String,
    size: String,
    attributes: Json<serde_json::Value>,
    sku: Option<String>,
    barcode: Option<String>,
    purchase_price: Option<Decimal>,
    selling_price: Decimal,
    mrp: Option<Decimal>,
    gst: Option<Decimal>,
    inventory_quantity: i32,
    weight: Option<Decimal>,
    image_url: Option<String>,
    images: Vec<String>,
    position: Option<i32>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductVariantRow> for ProductVariant {
    type Error = RepositoryError;

    fn try_from(row: ProductVariantRow) -> Result<Self, Self::Error> {
        let attributes: BTreeMap<String, String> = serde_json::from_value(row.attributes.0)
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid attributes for variant {}: {e}",
                    row.id
                ))
            })?;

        Ok(Self {
            id: VariantId::new(row.id),
            product_id: ProductId::new(row.product_id),
            fields: VariantFields {
                color: row.color,
                size: row.size,
                purchase_price: row.purchase_price,
                selling_price: row.selling_price,
                mrp: row.mrp,
                gst: row.gst,
                sku: row.sku,
                barcode: row.barcode,
                weight: row.weight,
                inventory_quantity: row.inventory_quantity,
                is_default: row.is_default,
                attributes,
                images: row.images,
                image_url: row.image_url,
            },
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product variant database operations.
pub struct VariantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VariantRepository<'a> {
    /// Create a new variant repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the variants of a product in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductVariantRow>(concat!(
            "SELECT ",
            variant_columns!(),
            " FROM product_variants WHERE product_id = $1 ORDER BY position NULLS LAST, id"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get one variant of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<Option<ProductVariant>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductVariantRow>(concat!(
            "SELECT ",
            variant_columns!(),
            " FROM product_variants WHERE product_id = $1 AND id = $2"
        ))
        .bind(product_id)
        .bind(variant_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a variant at the end of the product's variant list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        product_id: ProductId,
        fields: &VariantFields,
    ) -> Result<ProductVariant, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let variant = insert_variant(&mut tx, product_id, fields).await?;
        tx.commit().await?;

        tracing::debug!(product_id = %product_id, variant_id = %variant.id, "variant created");
        Ok(variant)
    }

    /// Create several variants in one transaction.
    ///
    /// Either every variant is created or none is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if more than one variant is marked
    /// as default. Returns `RepositoryError::NotFound` if the product does
    /// not exist. Returns `RepositoryError::Database` if any insert fails.
    pub async fn create_many(
        &self,
        product_id: ProductId,
        batch: &[VariantFields],
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        if batch.iter().filter(|fields| fields.is_default).count() > 1 {
            return Err(RepositoryError::Conflict(
                "only one variant can be the default".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(batch.len());
        for fields in batch {
            created.push(insert_variant(&mut tx, product_id, fields).await?);
        }
        tx.commit().await?;

        tracing::info!(product_id = %product_id, count = created.len(), "variant batch created");
        Ok(created)
    }

    /// Overwrite every field of an existing variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant does not belong to
    /// the product. Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        fields: &VariantFields,
    ) -> Result<ProductVariant, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if fields.is_default {
            clear_default(&mut tx, product_id, Some(variant_id)).await?;
        }

        let row = sqlx::query_as::<_, ProductVariantRow>(concat!(
            r"
            UPDATE product_variants
            SET color = $3, size = $4, attributes = $5, sku = $6, barcode = $7,
                purchase_price = $8, selling_price = $9, mrp = $10, gst = $11,
                inventory_quantity = $12, weight = $13, image_url = $14, images = $15,
                is_default = $16, updated_at = NOW()
            WHERE product_id = $1 AND id = $2
            RETURNING ",
            variant_columns!()
        ))
        .bind(product_id)
        .bind(variant_id)
        .bind(&fields.color)
        .bind(&fields.size)
        .bind(Json(&fields.attributes))
        .bind(&fields.sku)
        .bind(&fields.barcode)
        .bind(fields.purchase_price)
        .bind(fields.selling_price)
        .bind(fields.mrp)
        .bind(fields.gst)
        .bind(fields.inventory_quantity)
        .bind(fields.weight)
        .bind(&fields.image_url)
        .bind(&fields.images)
        .bind(fields.is_default)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        tracing::debug!(product_id = %product_id, variant_id = %variant_id, "variant updated");
        row.try_into()
    }
}

/// Unset `is_default` on the product's variants, except `keep`.
async fn clear_default(
    conn: &mut PgConnection,
    product_id: ProductId,
    keep: Option<VariantId>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE product_variants
        SET is_default = FALSE, updated_at = NOW()
        WHERE product_id = $1 AND is_default AND ($2::INTEGER IS NULL OR id <> $2)
        ",
    )
    .bind(product_id)
    .bind(keep)
    .execute(conn)
    .await?;
    Ok(())
}

/// Lock the product row until the transaction ends.
///
/// Concurrent inserts for one product queue here, so each one reads the
/// position its predecessor committed.
async fn lock_product(conn: &mut PgConnection, product_id: ProductId) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM products WHERE id = $1 FOR UPDATE")
        .bind(product_id)
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or(RepositoryError::NotFound)
}

async fn insert_variant(
    conn: &mut PgConnection,
    product_id: ProductId,
    fields: &VariantFields,
) -> Result<ProductVariant, RepositoryError> {
    lock_product(&mut *conn, product_id).await?;
    if fields.is_default {
        clear_default(&mut *conn, product_id, None).await?;
    }

    let row = sqlx::query_as::<_, ProductVariantRow>(concat!(
        r"
        INSERT INTO product_variants (
            product_id, color, size, attributes, sku, barcode,
            purchase_price, selling_price, mrp, gst, inventory_quantity, weight,
            image_url, images, is_default, position
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
            (SELECT COALESCE(MAX(position) + 1, 0) FROM product_variants WHERE product_id = $1)
        )
        RETURNING ",
        variant_columns!()
    ))
    .bind(product_id)
    .bind(&fields.color)
    .bind(&fields.size)
    .bind(Json(&fields.attributes))
    .bind(&fields.sku)
    .bind(&fields.barcode)
    .bind(fields.purchase_price)
    .bind(fields.selling_price)
    .bind(fields.mrp)
    .bind(fields.gst)
    .bind(fields.inventory_quantity)
    .bind(fields.weight)
    .bind(&fields.image_url)
    .bind(&fields.images)
    .bind(fields.is_default)
    .fetch_one(conn)
    .await
    .map_err(RepositoryError::from_write)?;

    row.try_into()
}

impl VariantStore for VariantRepository<'_> {
    async fn create_variant(
        &self,
        product_id: ProductId,
        fields: &VariantFields,
    ) -> Result<ProductVariant, RepositoryError> {
        self.create(product_id, fields).await
    }

    async fn update_variant(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        fields: &VariantFields,
    ) -> Result<ProductVariant, RepositoryError> {
        self.update(product_id, variant_id, fields).await
    }
}
