//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (pings the database)
//!
//! # Persisted variants
//! GET    /api/products/{id}/variants               - List variants
//! POST   /api/products/{id}/variants               - Create one variant
//! POST   /api/products/{id}/variants/batch         - Create many in one transaction
//! PUT    /api/products/{id}/variants/{variant_id}  - Update one variant
//!
//! # Variant editor sessions
//! POST   /api/products/{id}/variant-editor         - Open a session ({variantId?})
//! GET    /api/variant-editor/{session}             - Session snapshot
//! DELETE /api/variant-editor/{session}             - Discard session
//! POST   /api/variant-editor/{session}/attributes  - Add custom attribute
//! DELETE /api/variant-editor/{session}/attributes/{name}
//! POST   /api/variant-editor/{session}/attributes/{name}/values
//! DELETE /api/variant-editor/{session}/attributes/{name}/values/{index}
//! POST   /api/variant-editor/{session}/generate    - Build the Color x Size matrix
//! PATCH  /api/variant-editor/{session}/variants/{index}
//! DELETE /api/variant-editor/{session}/variants/{index}
//! POST   /api/variant-editor/{session}/variants/{index}/default
//! POST   /api/variant-editor/{session}/variants/{index}/images (multipart)
//! DELETE /api/variant-editor/{session}/variants/{index}/images ({url})
//! POST   /api/variant-editor/{session}/variants/{index}/images/primary ({url})
//! POST   /api/variant-editor/{session}/bulk-edit
//! POST   /api/variant-editor/{session}/save
//! ```

pub mod editor;
pub mod health;
pub mod variants;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build the complete application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(variants::router())
        .merge(editor::router())
}
