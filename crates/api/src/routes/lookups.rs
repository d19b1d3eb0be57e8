//! Brand and type lookups.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use catalog_store::{CatalogBrand, CatalogBrandId, CatalogStore, CatalogType, CatalogTypeId};

use crate::AppState;
use crate::error::ApiError;

/// GET /api/catalog/brand
pub async fn brands<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CatalogBrand>>, ApiError> {
    Ok(Json(state.coordinator.store().list_brands().await?))
}

/// GET /api/catalog/brand/{id}
pub async fn brand<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i32>,
) -> Result<Json<CatalogBrand>, ApiError> {
    let id = CatalogBrandId::new(id);
    state
        .coordinator
        .store()
        .lookup_brand(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Catalog brand not found: {id}")))
}

/// GET /api/catalog/type
pub async fn types<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CatalogType>>, ApiError> {
    Ok(Json(state.coordinator.store().list_types().await?))
}

/// GET /api/catalog/type/{id}
pub async fn catalog_type<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i32>,
) -> Result<Json<CatalogType>, ApiError> {
    let id = CatalogTypeId::new(id);
    state
        .coordinator
        .store()
        .lookup_type(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Catalog type not found: {id}")))
}
