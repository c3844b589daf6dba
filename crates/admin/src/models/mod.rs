//! Domain models for admin.

pub mod product;
pub mod variant;

pub use product::ProductSummary;
pub use variant::ProductVariant;
