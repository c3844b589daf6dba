//! Persisted product variants.

use chrono::{DateTime, Utc};
use serde::Serialize;

use univendor_core::{DraftVariant, ProductId, VariantFields, VariantId, VariantKey};

/// A variant row from `product_variants` (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    #[serde(flatten)]
    pub fields: VariantFields,
    pub position: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductVariant> for DraftVariant {
    fn from(variant: ProductVariant) -> Self {
        let ProductVariant {
            id,
            product_id,
            fields,
            position,
            created_at,
            updated_at,
        } = variant;

        Self {
            id: VariantKey::Saved(id),
            product_id,
            color: fields.color,
            size: fields.size,
            attributes: fields.attributes,
            purchase_price: fields.purchase_price,
            selling_price: fields.selling_price,
            mrp: fields.mrp,
            gst: fields.gst,
            inventory_quantity: fields.inventory_quantity,
            is_default: fields.is_default,
            sku: fields.sku,
            barcode: fields.barcode,
            weight: fields.weight,
            images: fields.images,
            image_url: fields.image_url,
            position,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use super::*;

    fn variant() -> ProductVariant {
        ProductVariant {
            id: VariantId::new(7),
            product_id: ProductId::new(3),
            fields: VariantFields {
                color: "Navy".to_string(),
                size: "M".to_string(),
                purchase_price: None,
                selling_price: Decimal::new(4999, 2),
                mrp: None,
                gst: Some(Decimal::from(18)),
                sku: Some("TEE-Navy-M".to_string()),
                barcode: None,
                weight: None,
                inventory_quantity: 4,
                is_default: true,
                attributes: BTreeMap::from([
                    ("Color".to_string(), "Navy".to_string()),
                    ("Size".to_string(), "M".to_string()),
                ]),
                images: vec!["/uploads/a.png".to_string()],
                image_url: Some("/uploads/a.png".to_string()),
            },
            position: Some(0),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_into_draft_keeps_saved_id() {
        let draft = DraftVariant::from(variant());
        assert_eq!(draft.id, VariantKey::Saved(VariantId::new(7)));
        assert_eq!(draft.color, "Navy");
        assert!(draft.is_default);
        assert!(draft.created_at.is_some());
    }

    #[test]
    fn test_serializes_flat_camel_case() {
        let json = serde_json::to_value(variant()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["productId"], 3);
        assert_eq!(json["sellingPrice"], "49.99");
        assert_eq!(json["imageUrl"], "/uploads/a.png");
    }
}
