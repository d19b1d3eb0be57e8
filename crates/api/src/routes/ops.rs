//! Health and Prometheus endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use catalog_store::CatalogStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<usize>,
}

/// GET /health — reports whether the catalog store answers.
pub async fn health<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.coordinator.store().item_count().await {
        Ok(items) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                items: Some(items),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    items: None,
                }),
            )
        }
    }
}

/// GET /metrics — returns Prometheus-formatted metrics.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
