//! Persistence seam of the variant editor.

use std::future::Future;

use univendor_core::{ProductId, VariantFields, VariantId};

use crate::db::RepositoryError;
use crate::models::ProductVariant;

/// Where the editor sends variants on save.
///
/// Implemented by [`crate::db::VariantRepository`]; tests substitute an
/// in-memory store.
pub trait VariantStore: Send + Sync {
    /// Persist a new variant of `product_id`.
    fn create_variant(
        &self,
        product_id: ProductId,
        fields: &VariantFields,
    ) -> impl Future<Output = Result<ProductVariant, RepositoryError>> + Send;

    /// Overwrite an existing variant of `product_id`.
    fn update_variant(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        fields: &VariantFields,
    ) -> impl Future<Output = Result<ProductVariant, RepositoryError>> + Send;
}
