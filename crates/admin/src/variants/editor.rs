//! The variant editing session.
//!
//! ## Lifecycle
//!
//! 1. Open in create mode ([`VariantEditor::new`]) or for one persisted
//!    variant ([`VariantEditor::for_existing`])
//! 2. Add attribute values, then [`VariantEditor::generate_matrix`]
//! 3. Edit rows, set the default, apply bulk edits, attach images
//! 4. [`VariantEditor::save`] through a [`VariantStore`]
//!
//! Validation failures are recorded in the session's error map (keyed like
//! `attributeValue` or `variant_2_price`) and also returned to the caller.

use std::collections::{BTreeMap, HashSet};

use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use univendor_core::{
    AttributeName, AttributeSet, BulkEditPatch, DraftVariant, ImageError, ValidationErrors,
    VariantFields, VariantId, VariantKey, VariantUpdate, is_recognized_color, matrix_sku,
    sku_prefix,
};

use super::store::VariantStore;
use crate::db::RepositoryError;
use crate::models::{ProductSummary, ProductVariant};
use crate::services::Notice;

/// Storage folder for variant images.
pub const IMAGE_FOLDER: &str = "product-variants";

const DEFAULT_GST_PERCENT: i64 = 18;
const DEFAULT_INVENTORY: i32 = 10;

const ATTRIBUTE_VALUE_KEY: &str = "attributeValue";
const ATTRIBUTE_NAME_KEY: &str = "attributeName";
const MATRIX_KEY: &str = "matrix";
const VARIANTS_KEY: &str = "variants";
const BULK_KEYS: [&str; 3] = ["bulkSellingPrice", "bulkMrp", "bulkInventory"];

// =============================================================================
// Errors
// =============================================================================

/// Errors returned by editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Input was rejected; the messages are also in the session error map.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("attribute {0} cannot be removed")]
    ReservedAttribute(String),

    #[error("attribute {attribute} has no value at index {index}")]
    NoSuchValue { attribute: String, index: usize },

    #[error("no variant at index {0}")]
    NoSuchVariant(usize),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Errors returned by [`VariantEditor::save`].
#[derive(Debug, Error)]
pub enum SaveError {
    /// The working set failed pre-save validation. Nothing was sent.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// At least one persistence call failed. Variants that were created stay
    /// created; the working set is left as it was.
    #[error("saved {succeeded} of {total} variants ({failed} failed): {source}")]
    Persistence {
        succeeded: usize,
        failed: usize,
        total: usize,
        source: RepositoryError,
    },

    /// The working set was already saved by this session.
    #[error("editor session already saved")]
    Closed,
}

impl SaveError {
    /// Operator notice describing the failure.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Validation(_) => Notice::error("Error", "Please fix the highlighted fields"),
            Self::Persistence { .. } => Notice::error("Error", "Failed to save variants"),
            Self::Closed => Notice::error("Error", "These variants were already saved"),
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Whether the session creates new variants or edits a persisted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorMode {
    Create,
    Edit,
}

/// Result of adding an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedValue {
    /// The stored (trimmed) value.
    pub value: String,
    /// Set when a color value is neither a common name nor a hex code.
    pub advisory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkEditOutcome {
    pub updated: usize,
    pub notice: Notice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub variants: Vec<ProductVariant>,
    pub notice: Notice,
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub product: ProductSummary,
    pub mode: EditorMode,
    pub attributes: AttributeSet,
    pub combination_count: usize,
    pub variants: Vec<DraftVariant>,
    pub errors: ValidationErrors,
}

// =============================================================================
// VariantEditor
// =============================================================================

/// One operator's variant editing session.
#[derive(Debug, Clone)]
pub struct VariantEditor {
    product: ProductSummary,
    mode: EditorMode,
    attributes: AttributeSet,
    variants: Vec<DraftVariant>,
    errors: ValidationErrors,
    /// Set by a successful save; a closed editor never persists again.
    closed: bool,
}

impl VariantEditor {
    /// Open a session for creating variants of `product`.
    #[must_use]
    pub fn new(product: ProductSummary) -> Self {
        Self {
            product,
            mode: EditorMode::Create,
            attributes: AttributeSet::new(),
            variants: Vec::new(),
            errors: ValidationErrors::new(),
            closed: false,
        }
    }

    /// Open a session editing one persisted variant.
    ///
    /// Color and Size are seeded with the variant's values and every other
    /// entry of its attribute map becomes a custom attribute.
    #[must_use]
    pub fn for_existing(product: ProductSummary, variant: ProductVariant) -> Self {
        let draft = DraftVariant::from(variant);

        let mut attributes = AttributeSet::new();
        seed_value(&mut attributes, &AttributeName::Color, &draft.color);
        seed_value(&mut attributes, &AttributeName::Size, &draft.size);
        for (name, value) in &draft.attributes {
            let name = AttributeName::from(name.as_str());
            if name.is_reserved() {
                continue;
            }
            attributes.add(name.clone());
            seed_value(&mut attributes, &name, value);
        }

        Self {
            product,
            mode: EditorMode::Edit,
            attributes,
            variants: vec![draft],
            errors: ValidationErrors::new(),
            closed: false,
        }
    }

    #[must_use]
    pub const fn product(&self) -> &ProductSummary {
        &self.product
    }

    #[must_use]
    pub const fn mode(&self) -> EditorMode {
        self.mode
    }

    #[must_use]
    pub const fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// The working set of draft variants.
    #[must_use]
    pub fn variants(&self) -> &[DraftVariant] {
        &self.variants
    }

    #[must_use]
    pub const fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Whether a save has already succeeded.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of drafts [`Self::generate_matrix`] would produce.
    #[must_use]
    pub fn combination_count(&self) -> usize {
        self.attributes.colors().len() * self.attributes.sizes().len()
    }

    #[must_use]
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            product: self.product.clone(),
            mode: self.mode,
            attributes: self.attributes.clone(),
            combination_count: self.combination_count(),
            variants: self.variants.clone(),
            errors: self.errors.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Add a value to an attribute.
    ///
    /// Color values that are not a common color name or hex code are kept,
    /// with an advisory. When editing a single variant, the variant picks up
    /// the new value.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::UnknownAttribute` if the attribute does not
    /// exist, or `EditorError::Validation` (key `attributeValue`) if the value
    /// is empty or already present ignoring case.
    pub fn add_attribute_value(
        &mut self,
        attribute: &AttributeName,
        candidate: &str,
    ) -> Result<AddedValue, EditorError> {
        let Some(target) = self.attributes.get_mut(attribute) else {
            return Err(EditorError::UnknownAttribute(attribute.to_string()));
        };
        let value = match target.push_value(candidate) {
            Ok(value) => value,
            Err(err) => return Err(self.reject(ATTRIBUTE_VALUE_KEY, err.to_string())),
        };
        self.errors.clear(ATTRIBUTE_VALUE_KEY);

        let advisory = (*attribute == AttributeName::Color && !is_recognized_color(&value))
            .then(|| {
                let message = format!("\"{value}\" might not be a standard color name or hex code");
                tracing::warn!(product_id = %self.product.id, "{message}");
                message
            });

        if self.mode == EditorMode::Edit {
            if let [draft] = self.variants.as_mut_slice() {
                draft.set_attribute(attribute, &value);
            }
        }

        Ok(AddedValue { value, advisory })
    }

    /// Remove the value at `index`. Generated drafts are not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute or the index does not exist.
    pub fn remove_attribute_value(
        &mut self,
        attribute: &AttributeName,
        index: usize,
    ) -> Result<String, EditorError> {
        self.attributes
            .get_mut(attribute)
            .ok_or_else(|| EditorError::UnknownAttribute(attribute.to_string()))?
            .remove_value(index)
            .ok_or_else(|| EditorError::NoSuchValue {
                attribute: attribute.to_string(),
                index,
            })
    }

    /// Add a custom attribute with no values.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Validation` (key `attributeName`) if the name is
    /// empty or already used.
    pub fn add_attribute(&mut self, name: &str) -> Result<(), EditorError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.reject(ATTRIBUTE_NAME_KEY, "Attribute name cannot be empty"));
        }
        if !self.attributes.add(AttributeName::from(name)) {
            return Err(self.reject(ATTRIBUTE_NAME_KEY, "Attribute already exists"));
        }
        self.errors.clear(ATTRIBUTE_NAME_KEY);
        Ok(())
    }

    /// Remove a custom attribute.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::ReservedAttribute` for Color and Size, and
    /// `EditorError::UnknownAttribute` if no such attribute exists.
    pub fn remove_attribute(&mut self, name: &AttributeName) -> Result<(), EditorError> {
        if name.is_reserved() {
            return Err(EditorError::ReservedAttribute(name.to_string()));
        }
        self.attributes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EditorError::UnknownAttribute(name.to_string()))
    }

    // -------------------------------------------------------------------------
    // Matrix
    // -------------------------------------------------------------------------

    /// Replace the working set with one draft per color x size combination.
    ///
    /// Colors form the outer loop, sizes the inner one. Returns the number of
    /// drafts generated.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Validation` (key `matrix`) if Color or Size has
    /// no values; the working set is left unchanged.
    pub fn generate_matrix(&mut self) -> Result<usize, EditorError> {
        if self.attributes.colors().is_empty() || self.attributes.sizes().is_empty() {
            return Err(self.reject(
                MATRIX_KEY,
                "Both color and size must have at least one value",
            ));
        }
        self.errors.clear(MATRIX_KEY);

        let prefix = sku_prefix(self.product.sku.as_deref(), Some(&self.product.name));
        let price = self.product.selling_price.unwrap_or(Decimal::ZERO);
        // 70% of the selling price; normalized so zero reads "0".
        let purchase_price = (price * Decimal::new(7, 1)).normalize();

        let colors = self.attributes.colors();
        let sizes = self.attributes.sizes();
        let mut drafts = Vec::with_capacity(colors.len() * sizes.len());
        for color in colors {
            for size in sizes {
                drafts.push(DraftVariant {
                    id: VariantKey::generate(),
                    product_id: self.product.id,
                    color: color.clone(),
                    size: size.clone(),
                    attributes: BTreeMap::from([
                        (AttributeName::COLOR.to_owned(), color.clone()),
                        (AttributeName::SIZE.to_owned(), size.clone()),
                    ]),
                    purchase_price: Some(purchase_price),
                    selling_price: price,
                    mrp: Some(price),
                    gst: Some(Decimal::from(DEFAULT_GST_PERCENT)),
                    inventory_quantity: DEFAULT_INVENTORY,
                    is_default: false,
                    sku: Some(matrix_sku(&prefix, color, size)),
                    barcode: None,
                    weight: None,
                    images: Vec::new(),
                    image_url: None,
                    position: None,
                    created_at: None,
                    updated_at: None,
                });
            }
        }

        tracing::info!(
            product_id = %self.product.id,
            count = drafts.len(),
            "variant matrix generated"
        );
        self.variants = drafts;
        Ok(self.variants.len())
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Apply a partial edit to the draft at `index`.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::NoSuchVariant` for a bad index, or
    /// `EditorError::Validation` (keys `variant_{index}_price`, `_mrp`,
    /// `_inventory`) for negative amounts, in which case nothing changes.
    pub fn update_variant(
        &mut self,
        index: usize,
        update: &VariantUpdate,
    ) -> Result<(), EditorError> {
        if index >= self.variants.len() {
            return Err(EditorError::NoSuchVariant(index));
        }

        let errors = update.validate(index);
        if !errors.is_empty() {
            return Err(self.reject_all(errors));
        }

        if update.selling_price.is_some() {
            self.errors.clear(&format!("variant_{index}_price"));
        }
        if update.mrp.is_some() {
            self.errors.clear(&format!("variant_{index}_mrp"));
        }
        if update.inventory_quantity.is_some() {
            self.errors.clear(&format!("variant_{index}_inventory"));
        }

        update.apply_to(self.draft_mut(index)?);
        Ok(())
    }

    /// Remove the draft at `index`.
    ///
    /// Row-keyed errors are dropped since the remaining rows shift.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::NoSuchVariant` for a bad index.
    pub fn remove_variant(&mut self, index: usize) -> Result<DraftVariant, EditorError> {
        if index >= self.variants.len() {
            return Err(EditorError::NoSuchVariant(index));
        }
        self.errors.clear_prefix("variant_");
        Ok(self.variants.remove(index))
    }

    /// Make the draft at `index` the only default.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::NoSuchVariant` for a bad index.
    pub fn set_default_variant(&mut self, index: usize) -> Result<(), EditorError> {
        if index >= self.variants.len() {
            return Err(EditorError::NoSuchVariant(index));
        }
        for (i, draft) in self.variants.iter_mut().enumerate() {
            draft.is_default = i == index;
        }
        Ok(())
    }

    /// Apply `patch` to the drafts whose keys are in `selected`.
    ///
    /// An empty selection changes nothing and yields a warning notice.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Validation` (keys `bulkSellingPrice`, `bulkMrp`,
    /// `bulkInventory`) if the patch carries negative values; no draft is
    /// modified.
    pub fn apply_bulk_edit(
        &mut self,
        patch: &BulkEditPatch,
        selected: &[VariantKey],
    ) -> Result<BulkEditOutcome, EditorError> {
        if selected.is_empty() {
            let notice = Notice::warning(
                "No variants selected",
                "Please select at least one variant to apply bulk edits",
            );
            notice.emit();
            return Ok(BulkEditOutcome { updated: 0, notice });
        }

        let errors = patch.validate();
        if !errors.is_empty() {
            return Err(self.reject_all(errors));
        }
        for key in BULK_KEYS {
            self.errors.clear(key);
        }

        let selected: HashSet<&VariantKey> = selected.iter().collect();
        let mut updated = 0;
        for draft in self
            .variants
            .iter_mut()
            .filter(|draft| selected.contains(&draft.id))
        {
            patch.apply_to(draft);
            updated += 1;
        }

        let notice = Notice::success("Bulk edit applied", format!("Updated {updated} variants"));
        notice.emit();
        Ok(BulkEditOutcome { updated, notice })
    }

    // -------------------------------------------------------------------------
    // Images
    // -------------------------------------------------------------------------

    /// Append uploaded image URLs to the draft at `index`.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::NoSuchVariant` for a bad index.
    pub fn attach_images(&mut self, index: usize, urls: Vec<String>) -> Result<(), EditorError> {
        self.draft_mut(index)?.attach_images(urls);
        Ok(())
    }

    /// Remove an image from the draft at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad index or an image that is not attached.
    pub fn detach_image(&mut self, index: usize, url: &str) -> Result<(), EditorError> {
        self.draft_mut(index)?.detach_image(url)?;
        Ok(())
    }

    /// Make an attached image the primary image of the draft at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad index or an image that is not attached.
    pub fn set_primary_image(&mut self, index: usize, url: &str) -> Result<(), EditorError> {
        self.draft_mut(index)?.set_primary_image(url)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Save
    // -------------------------------------------------------------------------

    /// Check the working set before submission.
    ///
    /// Replaces the session error map with every violation found and returns
    /// whether there were none.
    pub fn validate_before_save(&mut self) -> bool {
        let mut errors = ValidationErrors::new();
        if self.variants.is_empty() {
            errors.insert(VARIANTS_KEY, "No variants to save");
        }
        for (index, draft) in self.variants.iter().enumerate() {
            if draft.selling_price <= Decimal::ZERO {
                errors.insert(format!("variant_{index}_price"), "Price must be greater than 0");
            }
            if draft.inventory_quantity < 0 {
                errors.insert(
                    format!("variant_{index}_inventory"),
                    "Inventory cannot be negative",
                );
            }
        }

        let valid = errors.is_empty();
        self.errors = errors;
        valid
    }

    /// Persist the working set.
    ///
    /// Editing a single persisted variant issues one update. Otherwise every
    /// draft is created, all requests in flight at once. There is no rollback:
    /// when some creates fail the others stay persisted.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::Closed` if the editor was already saved,
    /// `SaveError::Validation` if pre-save validation fails, or
    /// `SaveError::Persistence` with success/failure counts if any store call
    /// fails.
    pub async fn save<S: VariantStore>(&mut self, store: &S) -> Result<SaveOutcome, SaveError> {
        if self.closed {
            return Err(SaveError::Closed);
        }
        if !self.validate_before_save() {
            return Err(SaveError::Validation(self.errors.clone()));
        }

        let product_id = self.product.id;

        if let Some((variant_id, fields)) = self.update_target() {
            let variant = store
                .update_variant(product_id, variant_id, &fields)
                .await
                .map_err(|source| {
                    tracing::error!(
                        product_id = %product_id,
                        variant_id = %variant_id,
                        error = %source,
                        "variant update failed"
                    );
                    SaveError::Persistence {
                        succeeded: 0,
                        failed: 1,
                        total: 1,
                        source,
                    }
                })?;

            self.closed = true;
            let notice = Notice::success("Variant updated", "The variant has been updated successfully.");
            notice.emit();
            return Ok(SaveOutcome {
                variants: vec![variant],
                notice,
            });
        }

        let payloads: Vec<VariantFields> = self.variants.iter().map(DraftVariant::fields).collect();
        let results = join_all(
            payloads
                .iter()
                .map(|fields| store.create_variant(product_id, fields)),
        )
        .await;

        let total = results.len();
        let mut created = Vec::with_capacity(total);
        let mut failed = 0;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(variant) => created.push(variant),
                Err(err) => {
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if let Some(source) = first_error {
            tracing::error!(
                product_id = %product_id,
                succeeded = created.len(),
                failed,
                error = %source,
                "variant creation partially failed"
            );
            return Err(SaveError::Persistence {
                succeeded: created.len(),
                failed,
                total,
                source,
            });
        }

        self.closed = true;
        let notice = Notice::success("Variants created", "New variants have been created successfully.");
        notice.emit();
        Ok(SaveOutcome {
            variants: created,
            notice,
        })
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// The persisted variant to update, when editing exactly one.
    fn update_target(&self) -> Option<(VariantId, VariantFields)> {
        match (self.mode, self.variants.as_slice()) {
            (EditorMode::Edit, [draft]) => draft.id.saved_id().map(|id| (id, draft.fields())),
            _ => None,
        }
    }

    fn draft_mut(&mut self, index: usize) -> Result<&mut DraftVariant, EditorError> {
        self.variants
            .get_mut(index)
            .ok_or(EditorError::NoSuchVariant(index))
    }

    /// Record one message and build the matching error.
    fn reject(&mut self, key: &str, message: impl Into<String>) -> EditorError {
        let mut errors = ValidationErrors::new();
        errors.insert(key, message);
        self.reject_all(errors)
    }

    /// Record every message and build the matching error.
    fn reject_all(&mut self, errors: ValidationErrors) -> EditorError {
        for (key, message) in errors.iter() {
            self.errors.insert(key, message);
        }
        EditorError::Validation(errors)
    }
}

/// Seed an attribute with a stored value. Blank values are skipped.
fn seed_value(attributes: &mut AttributeSet, name: &AttributeName, value: &str) {
    if let Some(attribute) = attributes.get_mut(name) {
        let _ = attribute.push_value(value);
    }
}
