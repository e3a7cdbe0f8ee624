pub mod handlers;
pub mod registry;
pub mod runtime;

pub use registry::{ClientFactory, ClientRegistry, KubeClientFactory};
pub use runtime::start_server;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::HealthConfig;
use crate::health::{liveness_handler, readiness_handler, HealthManager};
use crate::logging::trace_requests;
use crate::middleware::metrics_middleware;
use crate::observability::metrics_endpoint;

/// Shared state for every route
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ClientRegistry>,
    pub health: HealthManager,
}

impl FromRef<AppState> for HealthManager {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}

/// Build the gateway router
///
/// Monitor routes sit under `/api/v1/monitor`. Health paths come from
/// configuration; `/metrics` serves the gateway's own Prometheus output.
pub fn create_router(state: AppState, health: &HealthConfig) -> Router {
    let monitor = Router::new()
        .route("/launchpad", post(handlers::launchpad_handler))
        .route("/database", post(handlers::database_handler))
        .route("/minio", post(handlers::minio_handler))
        .route("/query", post(handlers::raw_query_handler))
        .route(
            "/cache",
            get(handlers::cache_stats_handler).delete(handlers::clear_cache_handler),
        );

    Router::new()
        .route("/metrics", get(metrics_endpoint))
        .route(&health.liveness_path, get(liveness_handler))
        .route(&health.readiness_path, get(readiness_handler))
        .nest("/api/v1/monitor", monitor)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(trace_requests))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
