use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;

/// Health status for individual services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is fully operational
    Healthy,
    /// Service is operational but with reduced capacity
    Degraded,
    /// Service is not operational
    Unhealthy,
    /// Service is still starting up
    Starting,
}

impl HealthStatus {
    /// Lower is worse
    fn priority(&self) -> u8 {
        match self {
            HealthStatus::Unhealthy => 0,
            HealthStatus::Starting => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Healthy => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub message: String,
    pub last_checked: Option<std::time::SystemTime>,
    pub metadata: HashMap<String, String>,
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status (worst of all services)
    pub status: HealthStatus,
    pub services: HashMap<String, ServiceHealth>,
    pub timestamp: std::time::SystemTime,
    pub uptime_seconds: u64,
}

/// Tracks readiness of the gateway's components
#[derive(Debug, Clone)]
pub struct HealthManager {
    services: Arc<RwLock<HashMap<String, ServiceHealth>>>,
    startup_time: Instant,
    startup_grace_period: Duration,
}

impl HealthManager {
    pub fn new() -> Self {
        let mut services = HashMap::new();
        services.insert(
            "api".to_string(),
            ServiceHealth {
                status: HealthStatus::Starting,
                message: "API server starting up".to_string(),
                last_checked: Some(std::time::SystemTime::now()),
                metadata: HashMap::new(),
            },
        );

        Self {
            services: Arc::new(RwLock::new(services)),
            startup_time: Instant::now(),
            startup_grace_period: Duration::from_secs(30),
        }
    }

    /// Mark the API service as ready (called after the listener binds)
    pub async fn mark_ready(&self) {
        self.update_service_health("api", HealthStatus::Healthy, "API server is ready".to_string())
            .await;
    }

    pub async fn update_service_health(&self, service_name: &str, status: HealthStatus, message: String) {
        let mut metadata = HashMap::new();
        metadata.insert("updated_at".to_string(), chrono::Utc::now().to_rfc3339());

        self.services.write().await.insert(
            service_name.to_string(),
            ServiceHealth {
                status,
                message,
                last_checked: Some(std::time::SystemTime::now()),
                metadata,
            },
        );

        info!("Updated health status for service '{}': {:?}", service_name, status);
    }

    pub async fn get_health(&self) -> HealthResponse {
        let services = self.services.read().await.clone();

        let status = services
            .values()
            .map(|s| s.status)
            .min_by_key(HealthStatus::priority)
            .unwrap_or(HealthStatus::Healthy);

        HealthResponse {
            status,
            services,
            timestamp: std::time::SystemTime::now(),
            uptime_seconds: self.startup_time.elapsed().as_secs(),
        }
    }

    pub fn is_in_startup_period(&self) -> bool {
        self.startup_time.elapsed() < self.startup_grace_period
    }
}

impl Default for HealthManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_manager_initialization() {
        let manager = HealthManager::new();
        let health = manager.get_health().await;

        assert_eq!(health.status, HealthStatus::Starting);
        assert_eq!(health.services["api"].status, HealthStatus::Starting);
    }

    #[tokio::test]
    async fn test_mark_ready() {
        let manager = HealthManager::new();
        manager.mark_ready().await;

        let health = manager.get_health().await;
        assert_eq!(health.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_overall_status_is_worst_service() {
        let manager = HealthManager::new();
        manager.mark_ready().await;
        manager
            .update_service_health("client_registry", HealthStatus::Degraded, "At capacity".to_string())
            .await;

        let health = manager.get_health().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.services["client_registry"].message, "At capacity");
    }

    #[test]
    fn test_status_priority() {
        assert!(HealthStatus::Unhealthy.priority() < HealthStatus::Starting.priority());
        assert!(HealthStatus::Starting.priority() < HealthStatus::Degraded.priority());
        assert!(HealthStatus::Degraded.priority() < HealthStatus::Healthy.priority());
    }

    #[tokio::test]
    async fn test_startup_grace_period() {
        let manager = HealthManager::new();
        assert!(manager.is_in_startup_period());
    }
}
