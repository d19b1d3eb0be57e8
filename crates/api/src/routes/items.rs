//! Catalog item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog_store::{CatalogItem, CatalogItemId, CatalogStore};
use coordinator::{CreateCatalogItem, DeleteOutcome, UpdateCatalogItem};

use crate::AppState;
use crate::error::ApiError;

/// GET /api/catalog/item/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i32>,
) -> Result<Json<CatalogItem>, ApiError> {
    let id = CatalogItemId::new(id);
    state
        .coordinator
        .store()
        .lookup_item(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Catalog item not found: {id}")))
}

/// POST /api/catalog/item — create an item mirrored in inventory.
#[tracing::instrument(skip(state, request))]
pub async fn create<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<CreateCatalogItem>,
) -> Result<(StatusCode, Json<CatalogItem>), ApiError> {
    let cancel = state.shutdown.child_token();
    let item = state.coordinator.create_item(request, &cancel).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/catalog/item/{id} — replace an item.
#[tracing::instrument(skip(state, request))]
pub async fn update<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCatalogItem>,
) -> Result<StatusCode, ApiError> {
    if request.id != CatalogItemId::new(id) {
        return Err(ApiError::BadRequest(
            "Id in route and body must match".to_string(),
        ));
    }

    let cancel = state.shutdown.child_token();
    state.coordinator.update_item(request, &cancel).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/catalog/item/{id}
///
/// Answers 204 once the local row is gone, even if inventory did not confirm.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let cancel = state.shutdown.child_token();
    let outcome = state
        .coordinator
        .delete_item(CatalogItemId::new(id), &cancel)
        .await?;

    if let DeleteOutcome::PartialFailure(reason) = outcome {
        tracing::warn!(item_id = id, reason = %reason, "delete applied without inventory confirmation");
    }
    Ok(StatusCode::NO_CONTENT)
}
