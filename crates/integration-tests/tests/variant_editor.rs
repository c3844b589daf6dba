//! Variant matrix builder behavior through the public API.
//!
//! Persistence goes through the in-memory store, so no database is needed.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use univendor_admin::services::{EditorSessions, NoticeLevel};
use univendor_admin::variants::{EditorError, EditorMode, SaveError, VariantEditor};
use univendor_core::{AttributeName, BulkEditPatch, ProductId, VariantKey};
use univendor_integration_tests::{MemoryStore, fields, persisted, product};

fn editor_with(colors: &[&str], sizes: &[&str], price: Option<&str>) -> VariantEditor {
    let mut editor = VariantEditor::new(product("", None, price));
    for color in colors {
        editor
            .add_attribute_value(&AttributeName::Color, color)
            .unwrap();
    }
    for size in sizes {
        editor.add_attribute_value(&AttributeName::Size, size).unwrap();
    }
    editor
}

// ============================================================================
// Matrix generation
// ============================================================================

#[test]
fn test_matrix_has_one_draft_per_pair() {
    let colors = ["Red", "Green", "Blue", "Black"];
    let sizes = ["XS", "S", "M"];
    let mut editor = editor_with(&colors, &sizes, Some("12.50"));

    let generated = editor.generate_matrix().unwrap();

    assert_eq!(generated, colors.len() * sizes.len());
    let expected: Vec<(String, String)> = colors
        .iter()
        .flat_map(|c| sizes.iter().map(move |s| ((*c).to_string(), (*s).to_string())))
        .collect();
    let actual: Vec<(String, String)> = editor
        .variants()
        .iter()
        .map(|v| (v.color.clone(), v.size.clone()))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_matrix_defaults_without_price_or_sku() {
    let mut editor = editor_with(&["Red", "Blue"], &["S", "M"], None);
    editor.generate_matrix().unwrap();

    let json = serde_json::to_value(editor.variants()).unwrap();
    let skus: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["sku"].as_str().unwrap())
        .collect();
    assert_eq!(skus, ["PROD-Red-S", "PROD-Red-M", "PROD-Blue-S", "PROD-Blue-M"]);

    for variant in json.as_array().unwrap() {
        assert_eq!(variant["sellingPrice"], "0");
        assert_eq!(variant["mrp"], "0");
        assert_eq!(variant["purchasePrice"], "0");
        assert_eq!(variant["gst"], "18");
        assert_eq!(variant["inventoryQuantity"], 10);
        assert_eq!(variant["isDefault"], false);
        assert_eq!(variant["images"], serde_json::json!([]));
    }
}

#[test]
fn test_matrix_requires_both_attributes() {
    let mut editor = editor_with(&[], &["S"], None);
    assert!(matches!(
        editor.generate_matrix(),
        Err(EditorError::Validation(_))
    ));
    assert!(editor.errors().contains("matrix"));
    assert_eq!(editor.combination_count(), 0);
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_case_only_duplicate_is_rejected() {
    let mut editor = editor_with(&[], &[], None);
    editor
        .add_attribute_value(&AttributeName::Size, "Large")
        .unwrap();

    let result = editor.add_attribute_value(&AttributeName::Size, "LARGE");

    assert!(matches!(result, Err(EditorError::Validation(_))));
    assert_eq!(editor.errors().get("attributeValue"), Some("Value already exists"));
    assert_eq!(editor.attributes().sizes().len(), 1);
}

#[test]
fn test_removed_value_does_not_touch_generated_drafts() {
    let mut editor = editor_with(&["Red", "Blue"], &["S", "M"], Some("10"));
    editor.generate_matrix().unwrap();
    let before = editor.variants().to_vec();

    editor
        .remove_attribute_value(&AttributeName::Color, 0)
        .unwrap();
    assert_eq!(editor.variants(), before.as_slice());

    editor.generate_matrix().unwrap();
    assert_eq!(editor.variants().len(), 2);
    assert!(editor.variants().iter().all(|v| v.color == "Blue"));
}

#[test]
fn test_snapshot_lists_attributes_in_order() {
    let mut editor = editor_with(&["Red"], &["S"], None);
    editor.add_attribute("Material").unwrap();
    editor
        .add_attribute_value(&AttributeName::from("Material"), "Linen")
        .unwrap();

    let snapshot = serde_json::to_value(editor.snapshot()).unwrap();
    let names: Vec<&str> = snapshot["attributes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Color", "Size", "Material"]);
    assert_eq!(snapshot["mode"], "create");
    assert_eq!(snapshot["combinationCount"], 1);
}

// ============================================================================
// Rows and bulk edit
// ============================================================================

#[test]
fn test_default_moves_between_rows() {
    let mut editor = editor_with(&["Red", "Blue"], &["S", "M"], Some("10"));
    editor.generate_matrix().unwrap();

    editor.set_default_variant(0).unwrap();
    editor.set_default_variant(2).unwrap();

    let defaults: Vec<usize> = editor
        .variants()
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_default)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(defaults, [2]);
}

#[test]
fn test_bulk_price_hits_selected_rows_only() {
    let mut editor = editor_with(&["Red", "Blue"], &["S", "M"], Some("10"));
    editor.generate_matrix().unwrap();
    let before = editor.variants().to_vec();
    let selected: Vec<VariantKey> = vec![before[1].id, before[3].id];

    let patch: BulkEditPatch = serde_json::from_value(serde_json::json!({ "sellingPrice": 99.5 })).unwrap();
    let outcome = editor.apply_bulk_edit(&patch, &selected).unwrap();

    assert_eq!(outcome.updated, 2);
    assert_eq!(outcome.notice.level, NoticeLevel::Success);

    let after = serde_json::to_value(editor.variants()).unwrap();
    let original = serde_json::to_value(&before).unwrap();
    for index in [1, 3] {
        assert_eq!(after[index]["sellingPrice"], "99.5");
        assert_eq!(after[index]["mrp"], original[index]["mrp"]);
        assert_eq!(
            after[index]["inventoryQuantity"],
            original[index]["inventoryQuantity"]
        );
    }
    for index in [0, 2] {
        assert_eq!(after[index], original[index]);
    }
}

#[test]
fn test_bulk_edit_without_selection_warns() {
    let mut editor = editor_with(&["Red"], &["S"], Some("10"));
    editor.generate_matrix().unwrap();

    let outcome = editor
        .apply_bulk_edit(&BulkEditPatch::default(), &[])
        .unwrap();

    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.notice.level, NoticeLevel::Warning);
}

// ============================================================================
// Save
// ============================================================================

#[test]
fn test_one_non_positive_price_fails_validation() {
    let mut editor = editor_with(&["Red", "Blue"], &["S"], Some("10"));
    editor.generate_matrix().unwrap();
    let patch: BulkEditPatch = serde_json::from_value(serde_json::json!({ "sellingPrice": 0 })).unwrap();
    let target = [editor.variants()[1].id];
    editor.apply_bulk_edit(&patch, &target).unwrap();

    assert!(!editor.validate_before_save());
    assert_eq!(
        editor.errors().get("variant_1_price"),
        Some("Price must be greater than 0")
    );
    assert!(!editor.errors().contains("variant_0_price"));
}

#[tokio::test]
async fn test_save_creates_every_draft() {
    let mut editor = editor_with(&["Red", "Blue"], &["S", "M"], Some("10"));
    editor.generate_matrix().unwrap();
    editor.set_default_variant(0).unwrap();
    let store = MemoryStore::default();

    let outcome = editor.save(&store).await.unwrap();

    assert_eq!(outcome.variants.len(), 4);
    assert_eq!(outcome.notice.title, "Variants created");
    let created = store.created();
    assert_eq!(created.len(), 4);
    assert_eq!(created.iter().filter(|f| f.is_default).count(), 1);
}

#[tokio::test]
async fn test_queued_save_after_success_is_refused() {
    let sessions = EditorSessions::new(Duration::from_secs(60));
    let mut editor = editor_with(&["Red", "Blue"], &["S", "M"], Some("10"));
    editor.generate_matrix().unwrap();
    let id = sessions.open(editor).await;

    // Two requests fetched the session before either took the lock.
    let first = sessions.get(id).await.unwrap();
    let second = sessions.get(id).await.unwrap();
    let store = MemoryStore::default();

    {
        let mut editor = first.lock().await;
        editor.save(&store).await.unwrap();
        sessions.discard(id).await;
    }

    let mut editor = second.lock().await;
    assert!(editor.is_closed());
    assert!(matches!(
        editor.save(&store).await.unwrap_err(),
        SaveError::Closed
    ));
    assert_eq!(store.created().len(), 4);
    assert!(sessions.get(id).await.is_none());
}

#[tokio::test]
async fn test_partial_failure_reports_counts() {
    let mut editor = editor_with(&["Red", "Blue", "Green"], &["S"], Some("10"));
    editor.generate_matrix().unwrap();
    let store = MemoryStore::rejecting(&["Blue"]);

    let err = editor.save(&store).await.unwrap_err();

    assert!(matches!(
        err,
        SaveError::Persistence {
            succeeded: 2,
            failed: 1,
            total: 3,
            ..
        }
    ));
    assert_eq!(err.notice().description, "Failed to save variants");
    assert_eq!(store.created().len(), 2);
    assert_eq!(editor.variants().len(), 3);
}

#[tokio::test]
async fn test_edit_session_updates_in_place() {
    let product_id = ProductId::new(7);
    let existing = persisted(31, product_id, &fields("Red", "M", 120));
    let mut editor = VariantEditor::for_existing(product("Tee", Some("TEE"), Some("120")), existing);
    assert_eq!(editor.mode(), EditorMode::Edit);

    editor
        .add_attribute_value(&AttributeName::Color, "Navy")
        .unwrap();
    let store = MemoryStore::default();
    let outcome = editor.save(&store).await.unwrap();

    assert_eq!(outcome.notice.title, "Variant updated");
    let updated = store.updated();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].1.color, "Navy");
    assert_eq!(updated[0].1.attributes["Color"], "Navy");
    assert!(store.created().is_empty());
}

// ============================================================================
// Images
// ============================================================================

#[test]
fn test_primary_image_always_attached() {
    let mut editor = editor_with(&["Red"], &["S"], Some("10"));
    editor.generate_matrix().unwrap();

    editor
        .attach_images(
            0,
            vec![
                "/uploads/product-variants/a.webp".to_string(),
                "/uploads/product-variants/b.webp".to_string(),
            ],
        )
        .unwrap();
    assert_eq!(
        editor.variants()[0].image_url.as_deref(),
        Some("/uploads/product-variants/a.webp")
    );

    editor
        .detach_image(0, "/uploads/product-variants/a.webp")
        .unwrap();
    editor
        .detach_image(0, "/uploads/product-variants/b.webp")
        .unwrap();
    assert!(editor.variants()[0].images.is_empty());
    assert_eq!(editor.variants()[0].image_url, None);
}
