//! Core types for Univendor.
//!
//! This module provides type-safe wrappers for the variant-management domain.

pub mod attribute;
pub mod color;
pub mod id;
pub mod sku;
pub mod validation;
pub mod variant;

pub use attribute::{Attribute, AttributeName, AttributeSet, AttributeValueError};
pub use color::{COMMON_COLORS, is_hex_color, is_recognized_color};
pub use id::*;
pub use sku::{FALLBACK_SKU_PREFIX, matrix_sku, sku_prefix};
pub use validation::ValidationErrors;
pub use variant::{BulkEditPatch, DraftVariant, ImageError, VariantFields, VariantKey, VariantUpdate};
