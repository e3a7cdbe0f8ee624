use axum::{extract::State, http::StatusCode, response::Json};
use tracing::debug;

use super::{HealthManager, HealthResponse, HealthStatus};

/// Liveness probe: 200 as long as the process serves requests
pub async fn liveness_handler() -> &'static str {
    debug!("Liveness check requested");
    "OK"
}

/// Readiness probe with per-service detail
///
/// `Starting` is reported as ready during the startup grace period only.
pub async fn readiness_handler(
    State(health_manager): State<HealthManager>,
) -> Result<Json<HealthResponse>, StatusCode> {
    debug!("Readiness check requested");

    let health_response = health_manager.get_health().await;

    match health_response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => Ok(Json(health_response)),
        HealthStatus::Starting if health_manager.is_in_startup_period() => Ok(Json(health_response)),
        HealthStatus::Starting | HealthStatus::Unhealthy => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
