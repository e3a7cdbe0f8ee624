use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::AppState;
use crate::auth::{extract_caller_context, CacheStats};
use crate::client::MetricsClient;
use crate::error::AppError;
use crate::services::monitor::{DatabaseQuery, LaunchpadQuery, MinioQuery, RawQuery};
use crate::services::prometheus::QueryResponse;

/// Resolve the caller's client from the `Authorization` header
async fn caller_client(state: &AppState, headers: &HeaderMap) -> Result<Arc<MetricsClient>, AppError> {
    let caller = extract_caller_context(headers);
    let kubeconfig = caller.require_kubeconfig()?;
    debug!(trace_id = %caller.trace_id, "Resolving metrics client for caller");
    Ok(state.registry.get_or_create(&kubeconfig).await?)
}

pub async fn launchpad_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<LaunchpadQuery>,
) -> Result<Json<QueryResponse>, AppError> {
    let client = caller_client(&state, &headers).await?;
    Ok(Json(client.launchpad().query(&params).await?))
}

pub async fn database_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<DatabaseQuery>,
) -> Result<Json<QueryResponse>, AppError> {
    let client = caller_client(&state, &headers).await?;
    Ok(Json(client.database().query(&params).await?))
}

pub async fn minio_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<MinioQuery>,
) -> Result<Json<QueryResponse>, AppError> {
    let client = caller_client(&state, &headers).await?;
    Ok(Json(client.minio().query(&params).await?))
}

pub async fn raw_query_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<RawQuery>,
) -> Result<Json<QueryResponse>, AppError> {
    let client = caller_client(&state, &headers).await?;
    Ok(Json(client.raw().query(&params).await?))
}

pub async fn cache_stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CacheStats>, AppError> {
    let client = caller_client(&state, &headers).await?;
    Ok(Json(client.cache_stats().await))
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearCacheParams {
    pub namespace: Option<String>,
}

/// Drop one namespace's decision, or every decision when no namespace is given
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ClearCacheParams>,
) -> Result<StatusCode, AppError> {
    let client = caller_client(&state, &headers).await?;

    match params.namespace.as_deref().map(str::trim).filter(|ns| !ns.is_empty()) {
        Some(namespace) => {
            client.clear_namespace_cache(namespace).await;
            info!(namespace = %namespace, "Authorization cache entry cleared");
        }
        None => {
            client.clear_cache().await;
            info!("Authorization cache cleared");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
