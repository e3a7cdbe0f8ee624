//! `/metrics` route serving the gateway's own Prometheus metrics

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::recorder::get_metrics_manager;

pub async fn metrics_endpoint() -> Response {
    let manager = match get_metrics_manager() {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!("Metrics manager not initialized: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, "Metrics not available").into_response();
        }
    };

    let metrics_content = manager.render();

    tracing::debug!(
        metrics_size = %metrics_content.len(),
        "Metrics served successfully"
    );

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics_content,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::recorder::{init_metrics, MetricsConfig};

    #[tokio::test]
    async fn test_metrics_endpoint_serves_exposition() {
        init_metrics(MetricsConfig {
            environment: "test".to_string(),
        })
        .unwrap();

        let response = metrics_endpoint().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; version=0.0.4; charset=utf-8"
        );
    }
}
