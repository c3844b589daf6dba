//! Persisted variant API handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use tracing::instrument;

use univendor_core::{ProductId, ValidationErrors, VariantFields, VariantId};

use crate::{
    db::{ProductRepository, VariantRepository},
    error::AppError,
    models::ProductVariant,
    state::AppState,
};

/// Build the variants router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/products/{id}/variants",
            get(list_variants).post(create_variant),
        )
        .route("/api/products/{id}/variants/batch", post(create_batch))
        .route(
            "/api/products/{id}/variants/{variant_id}",
            put(update_variant),
        )
}

/// Request for creating several variants at once.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub variants: Vec<VariantFields>,
}

/// List the variants of a product.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state))]
pub async fn list_variants(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ProductVariant>>, AppError> {
    ensure_product(&state, product_id).await?;
    let variants = VariantRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;
    Ok(Json(variants))
}

/// Create one variant.
///
/// # Errors
///
/// Returns 422 if the fields are invalid and 404 if the product does not exist.
#[instrument(skip(state, fields))]
pub async fn create_variant(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(fields): Json<VariantFields>,
) -> Result<(StatusCode, Json<ProductVariant>), AppError> {
    let errors = fields.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let variant = VariantRepository::new(state.pool())
        .create(product_id, &fields)
        .await?;
    Ok((StatusCode::CREATED, Json(variant)))
}

/// Create several variants in one transaction.
///
/// # Errors
///
/// Returns 422 if any variant is invalid (keys are prefixed with
/// `variant_{index}_`), 409 if more than one variant is marked default.
#[instrument(skip(state, body), fields(count = body.variants.len()))]
pub async fn create_batch(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(body): Json<BatchRequest>,
) -> Result<(StatusCode, Json<Vec<ProductVariant>>), AppError> {
    if body.variants.is_empty() {
        return Err(AppError::BadRequest("no variants given".to_string()));
    }

    let mut errors = ValidationErrors::new();
    for (index, fields) in body.variants.iter().enumerate() {
        for (key, message) in fields.validate().iter() {
            errors.insert(format!("variant_{index}_{key}"), message);
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let created = VariantRepository::new(state.pool())
        .create_many(product_id, &body.variants)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Overwrite an existing variant.
///
/// # Errors
///
/// Returns 422 if the fields are invalid and 404 if the variant does not
/// belong to the product.
#[instrument(skip(state, fields))]
pub async fn update_variant(
    State(state): State<AppState>,
    Path((product_id, variant_id)): Path<(ProductId, VariantId)>,
    Json(fields): Json<VariantFields>,
) -> Result<Json<ProductVariant>, AppError> {
    let errors = fields.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let variant = VariantRepository::new(state.pool())
        .update(product_id, variant_id, &fields)
        .await?;
    Ok(Json(variant))
}

async fn ensure_product(state: &AppState, product_id: ProductId) -> Result<(), AppError> {
    ProductRepository::new(state.pool())
        .get_summary(product_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))
}
