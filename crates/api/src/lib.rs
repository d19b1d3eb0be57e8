//! HTTP API for the catalog service.
//!
//! Exposes catalog reads and the coordinated create, update and delete
//! writes, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use catalog_store::CatalogStore;
use coordinator::{CatalogWriteCoordinator, CoordinatorConfig, InventoryNotifier};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CatalogStore> {
    pub coordinator: CatalogWriteCoordinator<S, Arc<dyn InventoryNotifier>>,
    /// Parent of every write's cancel token; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CatalogStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health::<S>))
        .route("/api/catalog/item", post(routes::items::create::<S>))
        .route(
            "/api/catalog/item/{id}",
            get(routes::items::get::<S>)
                .put(routes::items::update::<S>)
                .delete(routes::items::delete::<S>),
        )
        .route("/api/catalog/brand", get(routes::lookups::brands::<S>))
        .route("/api/catalog/brand/{id}", get(routes::lookups::brand::<S>))
        .route("/api/catalog/type", get(routes::lookups::types::<S>))
        .route("/api/catalog/type/{id}", get(routes::lookups::catalog_type::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a store and an inventory notifier.
pub fn create_state<S: CatalogStore + 'static>(
    store: S,
    notifier: Arc<dyn InventoryNotifier>,
    config: CoordinatorConfig,
    shutdown: CancellationToken,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        coordinator: CatalogWriteCoordinator::new(store, notifier, config),
        shutdown,
    })
}
