//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use catalog_store::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore};
use coordinator::{HttpInventoryNotifier, InMemoryInventoryNotifier, InventoryNotifier};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_notifier(config: &Config) -> Arc<dyn InventoryNotifier> {
    match config.http_notifier() {
        Some(notifier_config) => {
            tracing::info!(base_url = %notifier_config.base_url, "using HTTP inventory service");
            Arc::new(
                HttpInventoryNotifier::new(notifier_config)
                    .expect("failed to build inventory HTTP client"),
            )
        }
        None => {
            tracing::warn!("INVENTORY_BASE_URL not set, using in-memory inventory");
            Arc::new(InMemoryInventoryNotifier::new())
        }
    }
}

async fn serve<S: CatalogStore + 'static>(
    config: &Config,
    store: S,
    notifier: Arc<dyn InventoryNotifier>,
    metrics_handle: PrometheusHandle,
) {
    let shutdown = CancellationToken::new();
    let state = api::create_state(store, notifier, config.coordinator(), shutdown.clone());
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Cancels in-flight inventory calls.
            shutdown.cancel();
        })
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Build the inventory notifier
    let notifier = build_notifier(&config);

    // 4. Open the catalog store and serve
    match config.postgres_store() {
        Some(store_config) => {
            let store = PostgresCatalogStore::connect(&store_config)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL catalog store");
            serve(&config, store, notifier, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using seeded in-memory catalog store");
            let store = InMemoryCatalogStore::seeded(config.memory_store());
            serve(&config, store, notifier, metrics_handle).await;
        }
    }
}
