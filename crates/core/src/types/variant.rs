//! Draft variants, persistence payloads, and bulk-edit patches.
//!
//! Prices are [`Decimal`] values serialized as strings (`"99.5"`), matching
//! the `NUMERIC` columns of `product_variants`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::attribute::AttributeName;
use super::id::{ProductId, VariantId};
use super::validation::ValidationErrors;

/// Errors from image operations on a [`DraftVariant`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The URL is not in the variant's image list.
    #[error("image is not attached to this variant: {0}")]
    NotAttached(String),
}

/// Identifier of a variant in an editing session.
///
/// Generated variants carry a fresh token until they are persisted; a variant
/// loaded for editing keeps its database ID. Serialized as the bare UUID
/// string or the bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantKey {
    Saved(VariantId),
    Draft(Uuid),
}

impl VariantKey {
    /// Generate a fresh draft token.
    #[must_use]
    pub fn generate() -> Self {
        Self::Draft(Uuid::new_v4())
    }

    /// The database ID, if this variant was loaded from storage.
    #[must_use]
    pub const fn saved_id(&self) -> Option<VariantId> {
        match self {
            Self::Saved(id) => Some(*id),
            Self::Draft(_) => None,
        }
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(id) => write!(f, "{id}"),
            Self::Draft(token) => write!(f, "{token}"),
        }
    }
}

/// A candidate product variant held in an editing session.
///
/// ## Invariants
///
/// - `image_url` is `None` or a member of `images`
/// - `selling_price` must be positive and `inventory_quantity` non-negative
///   before the working set is submitted (checked at save time)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftVariant {
    pub id: VariantKey,
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    /// Attribute snapshot; mirrors `color`/`size` plus custom attributes.
    pub attributes: BTreeMap<String, String>,
    pub purchase_price: Option<Decimal>,
    pub selling_price: Decimal,
    pub mrp: Option<Decimal>,
    /// Tax rate in percent.
    pub gst: Option<Decimal>,
    pub inventory_quantity: i32,
    pub is_default: bool,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub weight: Option<Decimal>,
    pub images: Vec<String>,
    /// Primary image; always one of `images`.
    pub image_url: Option<String>,
    pub position: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DraftVariant {
    /// Set an attribute on this variant.
    ///
    /// `Color` and `Size` also update the top-level `color`/`size` fields.
    pub fn set_attribute(&mut self, name: &AttributeName, value: &str) {
        match name {
            AttributeName::Color => value.clone_into(&mut self.color),
            AttributeName::Size => value.clone_into(&mut self.size),
            AttributeName::Custom(_) => {}
        }
        self.attributes
            .insert(name.as_str().to_owned(), value.to_owned());
    }

    /// Append uploaded image URLs.
    ///
    /// If the variant has no primary image yet, the first new URL becomes primary.
    pub fn attach_images(&mut self, urls: impl IntoIterator<Item = String>) {
        let start = self.images.len();
        self.images.extend(urls);
        if self.image_url.is_none() {
            self.image_url = self.images.get(start).cloned();
        }
    }

    /// Remove an image.
    ///
    /// Removing the primary image promotes the first remaining image, or
    /// clears the primary when none remain.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::NotAttached`] if the URL is not in `images`.
    pub fn detach_image(&mut self, url: &str) -> Result<(), ImageError> {
        let position = self
            .images
            .iter()
            .position(|u| u == url)
            .ok_or_else(|| ImageError::NotAttached(url.to_owned()))?;
        self.images.remove(position);

        if self.images.is_empty() {
            self.image_url = None;
        } else if self.image_url.as_deref() == Some(url) {
            self.image_url = self.images.first().cloned();
        }
        Ok(())
    }

    /// Make an attached image the primary one.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::NotAttached`] if the URL is not in `images`.
    pub fn set_primary_image(&mut self, url: &str) -> Result<(), ImageError> {
        if !self.images.iter().any(|u| u == url) {
            return Err(ImageError::NotAttached(url.to_owned()));
        }
        self.image_url = Some(url.to_owned());
        Ok(())
    }

    /// The field set sent to the persistence layer.
    #[must_use]
    pub fn fields(&self) -> VariantFields {
        VariantFields {
            color: self.color.clone(),
            size: self.size.clone(),
            purchase_price: self.purchase_price,
            selling_price: self.selling_price,
            mrp: self.mrp,
            gst: self.gst,
            sku: self.sku.clone(),
            barcode: self.barcode.clone(),
            weight: self.weight,
            inventory_quantity: self.inventory_quantity,
            is_default: self.is_default,
            attributes: self.attributes.clone(),
            images: self.images.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Variant fields accepted by create and update operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantFields {
    pub color: String,
    pub size: String,
    #[serde(default)]
    pub purchase_price: Option<Decimal>,
    pub selling_price: Decimal,
    #[serde(default)]
    pub mrp: Option<Decimal>,
    #[serde(default)]
    pub gst: Option<Decimal>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub inventory_quantity: i32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl VariantFields {
    /// Check the record-level invariants of a single variant.
    ///
    /// Returns an empty map when the fields are valid.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.selling_price <= Decimal::ZERO {
            errors.insert("sellingPrice", "Price must be greater than 0");
        }
        if self.inventory_quantity < 0 {
            errors.insert("inventoryQuantity", "Inventory cannot be negative");
        }
        if self
            .image_url
            .as_ref()
            .is_some_and(|url| !self.images.contains(url))
        {
            errors.insert("imageUrl", "Primary image must be one of the variant images");
        }
        errors
    }
}

/// A partial update applied to a selection of draft variants.
///
/// Each field is tri-state: absent leaves the field untouched, `null` clears
/// it, a value overwrites it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEditPatch {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub selling_price: Option<Option<Decimal>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub mrp: Option<Option<Decimal>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub inventory_quantity: Option<Option<i32>>,
}

/// Marks a field as present, so `null` deserializes to `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl BulkEditPatch {
    /// Reject negative values.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if matches!(self.selling_price, Some(Some(price)) if price < Decimal::ZERO) {
            errors.insert("bulkSellingPrice", "Selling price cannot be negative");
        }
        if matches!(self.mrp, Some(Some(mrp)) if mrp < Decimal::ZERO) {
            errors.insert("bulkMrp", "MRP cannot be negative");
        }
        if matches!(self.inventory_quantity, Some(Some(quantity)) if quantity < 0) {
            errors.insert("bulkInventory", "Inventory cannot be negative");
        }
        errors
    }

    /// Overwrite the fields present in the patch.
    ///
    /// A cleared selling price or inventory becomes zero; a cleared MRP
    /// becomes `None`.
    pub fn apply_to(&self, variant: &mut DraftVariant) {
        if let Some(mrp) = self.mrp {
            variant.mrp = mrp;
        }
        if let Some(price) = self.selling_price {
            variant.selling_price = price.unwrap_or(Decimal::ZERO);
        }
        if let Some(quantity) = self.inventory_quantity {
            variant.inventory_quantity = quantity.unwrap_or(0);
        }
    }
}

/// A partial edit of one row in the variant table.
///
/// Nullable fields are tri-state like [`BulkEditPatch`]; `selling_price` and
/// `inventory_quantity` can only be overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub mrp: Option<Option<Decimal>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub purchase_price: Option<Option<Decimal>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub gst: Option<Option<Decimal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_quantity: Option<i32>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub sku: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub barcode: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub weight: Option<Option<Decimal>>,
}

impl VariantUpdate {
    /// Reject negative amounts, keyed by the row at `index`.
    #[must_use]
    pub fn validate(&self, index: usize) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.selling_price.is_some_and(|price| price < Decimal::ZERO) {
            errors.insert(format!("variant_{index}_price"), "Price cannot be negative");
        }
        if matches!(self.mrp, Some(Some(mrp)) if mrp < Decimal::ZERO) {
            errors.insert(format!("variant_{index}_mrp"), "MRP cannot be negative");
        }
        if self.inventory_quantity.is_some_and(|quantity| quantity < 0) {
            errors.insert(
                format!("variant_{index}_inventory"),
                "Inventory cannot be negative",
            );
        }
        errors
    }

    pub fn apply_to(&self, variant: &mut DraftVariant) {
        if let Some(price) = self.selling_price {
            variant.selling_price = price;
        }
        if let Some(mrp) = self.mrp {
            variant.mrp = mrp;
        }
        if let Some(purchase_price) = self.purchase_price {
            variant.purchase_price = purchase_price;
        }
        if let Some(gst) = self.gst {
            variant.gst = gst;
        }
        if let Some(quantity) = self.inventory_quantity {
            variant.inventory_quantity = quantity;
        }
        if let Some(sku) = &self.sku {
            variant.sku.clone_from(sku);
        }
        if let Some(barcode) = &self.barcode {
            variant.barcode.clone_from(barcode);
        }
        if let Some(weight) = self.weight {
            variant.weight = weight;
        }
    }
}
