//! Parent product facts used by the variant editor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use univendor_core::ProductId;

/// The fields of a product that seed generated variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    /// Product-level SKU, used as the prefix of generated variant SKUs.
    pub sku: Option<String>,
    /// Default selling price for generated variants.
    pub selling_price: Option<Decimal>,
}
