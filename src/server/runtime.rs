use anyhow::Result;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use super::{create_router, AppState, ClientRegistry, KubeClientFactory};
use crate::client::ClientOptions;
use crate::config::AppConfig;
use crate::health::{HealthManager, HealthStatus};

/// Start the gateway and serve until SIGINT or SIGTERM
///
/// In-flight requests get `server.shutdown_timeout` seconds to finish once a
/// signal arrives.
pub async fn start_server(config: AppConfig) -> Result<()> {
    info!(
        bind = %config.server.bind,
        port = config.server.port,
        "Starting metrics gateway"
    );

    let options = ClientOptions::from_config(&config);
    info!(
        backend = %options.backend_url,
        cache_ttl_ms = options.cache.ttl.as_millis() as u64,
        whitelisted_hosts = options.whitelist_hosts.len(),
        "Client options resolved"
    );

    let registry = Arc::new(ClientRegistry::new(
        Arc::new(KubeClientFactory::new(options)),
        config.server.max_clients,
    ));
    let health = HealthManager::new();

    let app = create_router(
        AppState {
            registry,
            health: health.clone(),
        },
        &config.health,
    );

    let bind_addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind to {}: {}. Is another process using this port?", bind_addr, e)
    })?;
    info!("Server successfully bound to {}", bind_addr);

    health.mark_ready().await;

    let shutdown_started = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown_started = shutdown_started.clone();
            let health = health.clone();
            async move {
                shutdown_signal().await;
                health
                    .update_service_health("api", HealthStatus::Unhealthy, "Shutting down".to_string())
                    .await;
                shutdown_started.notify_one();
            }
        })
        .into_future();

    let grace = Duration::from_secs(config.server.shutdown_timeout);
    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown_started.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(timeout_seconds = grace.as_secs(), "Graceful shutdown timed out, dropping open connections");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
