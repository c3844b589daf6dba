//! Variant matrix builder.
//!
//! An editing session ([`VariantEditor`]) collects attribute values, expands
//! Color x Size into draft variants, lets the operator edit them, and
//! persists the result through a [`VariantStore`].

pub mod editor;
pub mod store;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use editor::{
    AddedValue, BulkEditOutcome, EditorError, EditorMode, EditorSnapshot, IMAGE_FOLDER,
    SaveError, SaveOutcome, VariantEditor,
};
pub use store::VariantStore;
