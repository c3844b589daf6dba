//! SKU derivation for generated variants.
//!
//! Generated SKUs have the shape `{prefix}-{color}-{size}` where every run of
//! whitespace is collapsed into a single hyphen.

/// Prefix used when the product has neither a SKU nor a usable name.
pub const FALLBACK_SKU_PREFIX: &str = "PROD";

/// Number of leading name characters used as a SKU prefix.
const NAME_PREFIX_CHARS: usize = 3;

/// Choose the SKU prefix for a product.
///
/// The product's own SKU wins; otherwise the first three characters of the
/// product name, uppercased; otherwise [`FALLBACK_SKU_PREFIX`]. Empty strings
/// count as absent.
///
/// ```
/// use univendor_core::sku_prefix;
///
/// assert_eq!(sku_prefix(Some("TSH"), Some("Tee")), "TSH");
/// assert_eq!(sku_prefix(None, Some("hoodie")), "HOO");
/// assert_eq!(sku_prefix(Some(""), None), "PROD");
/// ```
#[must_use]
pub fn sku_prefix(product_sku: Option<&str>, product_name: Option<&str>) -> String {
    if let Some(sku) = product_sku.filter(|s| !s.is_empty()) {
        return sku.to_owned();
    }

    let from_name: String = product_name
        .unwrap_or_default()
        .chars()
        .take(NAME_PREFIX_CHARS)
        .collect::<String>()
        .to_uppercase();

    if from_name.is_empty() {
        FALLBACK_SKU_PREFIX.to_owned()
    } else {
        from_name
    }
}

/// Build the SKU of one color/size combination.
///
/// ```
/// use univendor_core::matrix_sku;
///
/// assert_eq!(matrix_sku("PROD", "Navy Blue", "X  Large"), "PROD-Navy-Blue-X-Large");
/// ```
#[must_use]
pub fn matrix_sku(prefix: &str, color: &str, size: &str) -> String {
    collapse_whitespace(&format!("{prefix}-{color}-{size}"))
}

fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push('-');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}
