//! Prometheus metrics recorder
//!
//! The recorder is installed once per process with service-level labels and
//! rendered by the gateway's own `/metrics` route.

use anyhow::{anyhow, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Arc, OnceLock};

/// Configuration for metrics collection
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Service environment (development, staging, production)
    pub environment: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
        }
    }
}

/// Global metrics manager with Prometheus integration
pub struct MetricsManager {
    handle: PrometheusHandle,
    config: MetricsConfig,
}

impl MetricsManager {
    fn install(config: MetricsConfig) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .add_global_label("service", "metrics-gate")
            .add_global_label("environment", &config.environment)
            .add_global_label("version", env!("CARGO_PKG_VERSION"))
            .install_recorder()
            .map_err(|e| anyhow!("Failed to install Prometheus recorder: {}", e))?;

        tracing::info!(
            environment = %config.environment,
            "Prometheus metrics recorder initialized"
        );

        Ok(Self { handle, config })
    }

    /// Get Prometheus metrics output
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }
}

static METRICS_MANAGER: OnceLock<Result<Arc<MetricsManager>, String>> = OnceLock::new();

/// Initialize the global metrics manager
///
/// Idempotent: later calls return the manager installed by the first one and
/// ignore their config.
pub fn init_metrics(config: MetricsConfig) -> Result<Arc<MetricsManager>> {
    METRICS_MANAGER
        .get_or_init(|| {
            MetricsManager::install(config)
                .map(Arc::new)
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(|e| anyhow!(e))
}

/// Get global metrics manager instance
pub fn get_metrics_manager() -> Result<Arc<MetricsManager>> {
    match METRICS_MANAGER.get() {
        Some(Ok(manager)) => Ok(manager.clone()),
        Some(Err(e)) => Err(anyhow!("Metrics recorder failed to initialize: {}", e)),
        None => Err(anyhow!("Metrics manager not initialized. Call init_metrics() first.")),
    }
}
