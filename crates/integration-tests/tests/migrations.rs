//! Layout and content of the admin migration directory.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::fs;
use std::path::{Path, PathBuf};

fn migrations_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../admin/migrations")
}

fn file_names() -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(migrations_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".sql"))
        .collect();
    names.sort();
    names
}

fn read(stem: &str, direction: &str) -> String {
    let name = file_names()
        .into_iter()
        .find(|name| name.contains(stem) && name.ends_with(&format!(".{direction}.sql")))
        .unwrap();
    fs::read_to_string(migrations_dir().join(name)).unwrap()
}

#[test]
fn test_every_up_has_a_down() {
    let names = file_names();
    let ups: Vec<&str> = names
        .iter()
        .filter_map(|n| n.strip_suffix(".up.sql"))
        .collect();
    let downs: Vec<&str> = names
        .iter()
        .filter_map(|n| n.strip_suffix(".down.sql"))
        .collect();

    assert_eq!(ups.len(), 8);
    assert_eq!(ups, downs);
}

#[test]
fn test_versions_are_unique_and_ordered() {
    let versions: Vec<i64> = file_names()
        .iter()
        .filter(|n| n.ends_with(".up.sql"))
        .map(|n| n.split('_').next().unwrap().parse().unwrap())
        .collect();

    assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_variants_get_color_size_and_one_default() {
    let up = read("product_variants_color_size", "up");
    assert!(up.contains("'One Size'"));
    assert!(up.contains("idx_product_variants_one_default"));

    let down = read("product_variants_color_size", "down");
    assert!(down.contains("DROP TABLE IF EXISTS product_variants"));
}

#[test]
fn test_has_variants_flag_is_dropped_and_restored() {
    assert!(read("drop_product_has_variants", "up").contains("DROP COLUMN IF EXISTS has_variants"));
    assert!(read("drop_product_has_variants", "down").contains("ADD COLUMN IF NOT EXISTS has_variants"));
}

#[test]
fn test_default_plans_are_seeded() {
    let up = read("subscription_plans", "up");
    for plan in ["'Basic'", "'Pro'", "'Business'"] {
        assert!(up.contains(plan), "missing plan {plan}");
    }
}
