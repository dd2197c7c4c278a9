//! Haven portfolio control-plane HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, and the HTTP router, then starts the main
//! API server and the metrics endpoint.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
mod api;
mod app;
mod auth;
mod config;
mod model;
mod observability;
mod store;
mod workflow;

use api::types::FeatureFlags;
use app::{build_router, AppState};
use std::future::Future;
use std::sync::Arc;
use store::{memory::InMemoryStore, PortfolioStore, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::ControlPlaneConfig::from_env_or_yaml().expect("control plane config");
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: config::ControlPlaneConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability();
    let state = build_state(config.clone()).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, "portfolio control plane listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: config::ControlPlaneConfig) -> anyhow::Result<AppState> {
    let store_config = StoreConfig {
        changes_limit: config.changes_limit,
        change_retention_max_rows: config.change_retention_max_rows,
    };
    let store: Arc<dyn PortfolioStore + Send + Sync> = Arc::new(InMemoryStore::new(store_config));

    Ok(AppState {
        api_version: "v1".to_string(),
        features: FeatureFlags {
            durable_storage: store.is_durable(),
            invite_tokens: true,
            invite_codes: true,
        },
        store,
        public_base_url: config.public_base_url,
    })
}
