//! In-memory [`VariantStore`] for tests of the editor and its callers.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use chrono::Utc;

use univendor_core::{ProductId, VariantFields, VariantId};

use super::store::VariantStore;
use crate::db::RepositoryError;
use crate::models::ProductVariant;

/// A persisted variant with the given ID.
#[must_use]
pub fn persisted(id: i32, product_id: ProductId, fields: &VariantFields) -> ProductVariant {
    ProductVariant {
        id: VariantId::new(id),
        product_id,
        fields: fields.clone(),
        position: Some(id),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Records every call. Creates whose color is in `reject_colors` fail with
/// a conflict.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: AtomicI32,
    reject_colors: Vec<String>,
    created: Mutex<Vec<VariantFields>>,
    updated: Mutex<Vec<(VariantId, VariantFields)>>,
}

impl MemoryStore {
    #[must_use]
    pub fn rejecting(colors: &[&str]) -> Self {
        Self {
            reject_colors: colors.iter().map(|c| (*c).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Payloads of successful creates, in completion order.
    #[must_use]
    pub fn created(&self) -> Vec<VariantFields> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Updates received, in order.
    #[must_use]
    pub fn updated(&self) -> Vec<(VariantId, VariantFields)> {
        self.updated.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl VariantStore for MemoryStore {
    async fn create_variant(
        &self,
        product_id: ProductId,
        fields: &VariantFields,
    ) -> Result<ProductVariant, RepositoryError> {
        if self.reject_colors.contains(&fields.color) {
            return Err(RepositoryError::Conflict(format!(
                "rejected {} / {}",
                fields.color, fields.size
            )));
        }
        if let Ok(mut created) = self.created.lock() {
            created.push(fields.clone());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(persisted(id, product_id, fields))
    }

    async fn update_variant(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        fields: &VariantFields,
    ) -> Result<ProductVariant, RepositoryError> {
        if let Ok(mut updated) = self.updated.lock() {
            updated.push((variant_id, fields.clone()));
        }
        Ok(persisted(variant_id.as_i32(), product_id, fields))
    }
}
