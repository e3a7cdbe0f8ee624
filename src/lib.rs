//! Authorization-gated access to namespace-scoped metrics
//!
//! Every query resolves a namespace, proves the caller may read pods there
//! through the Kubernetes control plane, and only then reaches the
//! Prometheus-compatible backend. Decisions are cached per client.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod services;

#[cfg(test)]
pub mod tests;

pub use client::{ClientOptions, MetricsClient};
pub use config::*;
pub use error::*;
pub use server::*;

use anyhow::Result;
use std::panic;

use crate::observability::{init_metrics, MetricsConfig};

/// Load configuration, install logging and metrics, then serve
pub async fn run_server(cli: Cli) -> Result<()> {
    let app_config = config::load_config(&cli)?;

    logging::setup_tracing(&app_config.logging)?;

    // Set up panic handler (so it can use logging)
    panic::set_hook(Box::new(|panic_info| {
        ::tracing::error!(?panic_info, "FATAL: Panic occurred");
    }));

    client::install_crypto_provider();

    init_metrics(MetricsConfig {
        environment: app_config.environment.as_str().to_string(),
    })?;

    ::tracing::info!(
        environment = app_config.environment.as_str(),
        version = env!("CARGO_PKG_VERSION"),
        "metrics-gate starting up"
    );

    server::start_server(app_config).await
}
