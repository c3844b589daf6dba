//! Variant editor session API handlers.
//!
//! A session is opened for a product, mutated through the endpoints below,
//! and closed by a successful save or an explicit discard. Every mutation
//! answers with the session snapshot so the client can re-render.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::instrument;
use uuid::Uuid;

use univendor_core::{AttributeName, BulkEditPatch, ProductId, VariantId, VariantKey, VariantUpdate};

use crate::{
    db::{ProductRepository, VariantRepository},
    error::AppError,
    services::{ImageStorage, UploadedImage},
    state::AppState,
    variants::{AddedValue, BulkEditOutcome, EditorSnapshot, IMAGE_FOLDER, SaveOutcome, VariantEditor},
};

/// Upper bound on one image upload request.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Build the editor router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products/{id}/variant-editor", post(open_session))
        .route(
            "/api/variant-editor/{session}",
            get(get_session).delete(discard_session),
        )
        .route("/api/variant-editor/{session}/attributes", post(add_attribute))
        .route(
            "/api/variant-editor/{session}/attributes/{name}",
            delete(remove_attribute),
        )
        .route(
            "/api/variant-editor/{session}/attributes/{name}/values",
            post(add_value),
        )
        .route(
            "/api/variant-editor/{session}/attributes/{name}/values/{index}",
            delete(remove_value),
        )
        .route("/api/variant-editor/{session}/generate", post(generate))
        .route(
            "/api/variant-editor/{session}/variants/{index}",
            patch(update_variant).delete(remove_variant),
        )
        .route(
            "/api/variant-editor/{session}/variants/{index}/default",
            post(set_default),
        )
        .route(
            "/api/variant-editor/{session}/variants/{index}/images",
            post(upload_images)
                .delete(detach_image)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/variant-editor/{session}/variants/{index}/images/primary",
            post(set_primary_image),
        )
        .route("/api/variant-editor/{session}/bulk-edit", post(bulk_edit))
        .route("/api/variant-editor/{session}/save", post(save))
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    /// Persisted variant to edit; omitted to create new variants.
    pub variant_id: Option<VariantId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub editor: EditorSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct AttributeRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ValueRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct AddedValueResponse {
    #[serde(flatten)]
    pub added: AddedValue,
    pub editor: EditorSnapshot,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub generated: usize,
    pub editor: EditorSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkEditRequest {
    pub patch: BulkEditPatch,
    pub selected: Vec<VariantKey>,
}

#[derive(Debug, Serialize)]
pub struct BulkEditResponse {
    #[serde(flatten)]
    pub outcome: BulkEditOutcome,
    pub editor: EditorSnapshot,
}

// =============================================================================
// Session Lifecycle
// =============================================================================

/// Open an editor session for a product.
///
/// # Errors
///
/// Returns 404 if the product, or the requested variant of it, does not exist.
#[instrument(skip(state, body))]
pub async fn open_session(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    body: Option<Json<OpenSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    let product = ProductRepository::new(state.pool())
        .get_summary(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let editor = match request.variant_id {
        Some(variant_id) => {
            let variant = VariantRepository::new(state.pool())
                .get(product_id, variant_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("variant {variant_id}")))?;
            VariantEditor::for_existing(product, variant)
        }
        None => VariantEditor::new(product),
    };

    let snapshot = editor.snapshot();
    let session_id = state.sessions().open(editor).await;
    tracing::info!(%session_id, mode = ?snapshot.mode, "editor session opened");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            editor: snapshot,
        }),
    ))
}

/// Current state of a session.
///
/// # Errors
///
/// Returns 404 for unknown or expired sessions.
#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
) -> Result<Json<EditorSnapshot>, AppError> {
    let editor = open_editor(&state, session).await?;
    Ok(Json(editor.snapshot()))
}

/// Discard a session without saving.
#[instrument(skip(state))]
pub async fn discard_session(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
) -> StatusCode {
    state.sessions().discard(session).await;
    StatusCode::NO_CONTENT
}

// =============================================================================
// Attributes
// =============================================================================

/// Add a custom attribute.
///
/// # Errors
///
/// Returns 422 if the name is empty or taken.
#[instrument(skip(state))]
pub async fn add_attribute(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
    Json(body): Json<AttributeRequest>,
) -> Result<Json<EditorSnapshot>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    editor.add_attribute(&body.name)?;
    Ok(Json(editor.snapshot()))
}

/// Remove a custom attribute.
///
/// # Errors
///
/// Returns 400 for Color and Size, 404 for unknown attributes.
#[instrument(skip(state))]
pub async fn remove_attribute(
    State(state): State<AppState>,
    Path((session, name)): Path<(Uuid, String)>,
) -> Result<Json<EditorSnapshot>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    editor.remove_attribute(&AttributeName::from(name))?;
    Ok(Json(editor.snapshot()))
}

/// Add a value to an attribute.
///
/// # Errors
///
/// Returns 422 for empty or duplicate values, 404 for unknown attributes.
#[instrument(skip(state))]
pub async fn add_value(
    State(state): State<AppState>,
    Path((session, name)): Path<(Uuid, String)>,
    Json(body): Json<ValueRequest>,
) -> Result<Json<AddedValueResponse>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    let added = editor.add_attribute_value(&AttributeName::from(name), &body.value)?;
    Ok(Json(AddedValueResponse {
        added,
        editor: editor.snapshot(),
    }))
}

/// Remove the value at `index` from an attribute.
///
/// # Errors
///
/// Returns 404 if the attribute or index does not exist.
#[instrument(skip(state))]
pub async fn remove_value(
    State(state): State<AppState>,
    Path((session, name, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<EditorSnapshot>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    editor.remove_attribute_value(&AttributeName::from(name), index)?;
    Ok(Json(editor.snapshot()))
}

// =============================================================================
// Matrix and Rows
// =============================================================================

/// Generate the Color x Size matrix.
///
/// # Errors
///
/// Returns 422 if Color or Size has no values.
#[instrument(skip(state))]
pub async fn generate(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
) -> Result<Json<GenerateResponse>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    let generated = editor.generate_matrix()?;
    Ok(Json(GenerateResponse {
        generated,
        editor: editor.snapshot(),
    }))
}

/// Edit one draft row.
///
/// # Errors
///
/// Returns 422 for negative amounts, 404 for a bad index.
#[instrument(skip(state))]
pub async fn update_variant(
    State(state): State<AppState>,
    Path((session, index)): Path<(Uuid, usize)>,
    Json(update): Json<VariantUpdate>,
) -> Result<Json<EditorSnapshot>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    editor.update_variant(index, &update)?;
    Ok(Json(editor.snapshot()))
}

/// Remove one draft row.
///
/// # Errors
///
/// Returns 404 for a bad index.
#[instrument(skip(state))]
pub async fn remove_variant(
    State(state): State<AppState>,
    Path((session, index)): Path<(Uuid, usize)>,
) -> Result<Json<EditorSnapshot>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    editor.remove_variant(index)?;
    Ok(Json(editor.snapshot()))
}

/// Make one draft the default variant.
///
/// # Errors
///
/// Returns 404 for a bad index.
#[instrument(skip(state))]
pub async fn set_default(
    State(state): State<AppState>,
    Path((session, index)): Path<(Uuid, usize)>,
) -> Result<Json<EditorSnapshot>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    editor.set_default_variant(index)?;
    Ok(Json(editor.snapshot()))
}

/// Apply a bulk edit to the selected drafts.
///
/// # Errors
///
/// Returns 422 for negative values.
#[instrument(skip(state, body), fields(selected = body.selected.len()))]
pub async fn bulk_edit(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
    Json(body): Json<BulkEditRequest>,
) -> Result<Json<BulkEditResponse>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    let outcome = editor.apply_bulk_edit(&body.patch, &body.selected)?;
    Ok(Json(BulkEditResponse {
        outcome,
        editor: editor.snapshot(),
    }))
}

// =============================================================================
// Images
// =============================================================================

/// Upload images for one draft (multipart, one or more file parts).
///
/// # Errors
///
/// Returns 404 for a bad index, 400 for empty uploads or unsupported types.
#[instrument(skip(state, multipart))]
pub async fn upload_images(
    State(state): State<AppState>,
    Path((session, index)): Path<(Uuid, usize)>,
    mut multipart: Multipart,
) -> Result<Json<EditorSnapshot>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    if index >= editor.variants().len() {
        return Err(AppError::NotFound(format!("no variant at index {index}")));
    }

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        files.push(UploadedImage {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    let urls = state.images().upload(IMAGE_FOLDER, files).await?;
    editor.attach_images(index, urls)?;
    Ok(Json(editor.snapshot()))
}

/// Detach an image from one draft.
///
/// # Errors
///
/// Returns 404 for a bad index or an image that is not attached.
#[instrument(skip(state))]
pub async fn detach_image(
    State(state): State<AppState>,
    Path((session, index)): Path<(Uuid, usize)>,
    Json(body): Json<ImageRequest>,
) -> Result<Json<EditorSnapshot>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    editor.detach_image(index, &body.url)?;
    Ok(Json(editor.snapshot()))
}

/// Choose the primary image of one draft.
///
/// # Errors
///
/// Returns 404 for a bad index or an image that is not attached.
#[instrument(skip(state))]
pub async fn set_primary_image(
    State(state): State<AppState>,
    Path((session, index)): Path<(Uuid, usize)>,
    Json(body): Json<ImageRequest>,
) -> Result<Json<EditorSnapshot>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    editor.set_primary_image(index, &body.url)?;
    Ok(Json(editor.snapshot()))
}

// =============================================================================
// Save
// =============================================================================

/// Persist the session's working set and close the session.
///
/// On failure the session stays open with its working set intact.
///
/// # Errors
///
/// Returns 422 if pre-save validation fails, 500 with success/failure
/// counts if persistence fails.
#[instrument(skip(state))]
pub async fn save(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
) -> Result<Json<SaveOutcome>, AppError> {
    let mut editor = open_editor(&state, session).await?;
    let store = VariantRepository::new(state.pool());
    let outcome = editor
        .save(&store)
        .await
        .inspect_err(|err| err.notice().emit())?;

    state.sessions().discard(session).await;
    Ok(Json(outcome))
}

/// Lock the editor of an open session.
///
/// Requests queued on the lock while a save succeeded find the editor
/// closed and get the same 404 as an unknown session.
async fn open_editor(
    state: &AppState,
    session: Uuid,
) -> Result<OwnedMutexGuard<VariantEditor>, AppError> {
    let not_found = || AppError::NotFound(format!("editor session {session}"));
    let editor = state
        .sessions()
        .get(session)
        .await
        .ok_or_else(not_found)?
        .lock_owned()
        .await;
    if editor.is_closed() {
        return Err(not_found());
    }
    Ok(editor)
}
