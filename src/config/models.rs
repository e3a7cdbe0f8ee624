use garde::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::auth::cache::CacheConfig;

/// Backend used when neither the config nor `METRICS_URL` names one
pub const DEFAULT_BACKEND_URL: &str = "http://prometheus-server.monitoring.svc.cluster.local:9090";

#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
pub struct AppConfig {
    #[garde(dive)]
    #[serde(default)]
    pub server: ServerConfig,

    #[garde(dive)]
    #[serde(default)]
    pub logging: LoggingConfig,

    #[garde(dive)]
    #[serde(default)]
    pub auth: AuthConfig,

    #[garde(dive)]
    #[serde(default)]
    pub backend: BackendConfig,

    #[garde(dive)]
    #[serde(default)]
    pub health: HealthConfig,

    #[garde(skip)]
    #[serde(default)]
    pub environment: Environment,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[garde(range(min = 1024, max = 65535))]
    pub port: u16,

    #[garde(length(min = 1), custom(validate_bind_address))]
    #[serde(default = "default_bind")]
    pub bind: String,

    #[garde(range(min = 1, max = 300))]
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64, // seconds

    /// Upper bound on cached per-credential clients
    #[garde(range(min = 1, max = 100000))]
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_clients() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bind: default_bind(),
            shutdown_timeout: default_shutdown_timeout(),
            max_clients: default_max_clients(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LoggingConfig {
    #[garde(length(min = 1))]
    #[serde(default = "default_log_level")]
    pub level: String, // trace, debug, info, warn, error

    #[garde(pattern(r"^(json|pretty)$"))]
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Authorization cache and control-plane settings
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AuthConfig {
    /// Decision lifetime in milliseconds; 0 disables caching
    #[garde(range(max = 86_400_000))]
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    #[garde(range(min = 1000, max = 3_600_000))]
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Control-plane hosts a caller's kubeconfig may point at directly
    #[garde(inner(length(min = 1)))]
    #[serde(default)]
    pub whitelist_hosts: Vec<String>,

    #[garde(range(min = 100, max = 120_000))]
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[garde(skip)]
    #[serde(default)]
    pub background_sweep: bool,
}

fn default_cache_ttl_ms() -> u64 {
    300_000
}

fn default_sweep_interval_ms() -> u64 {
    60_000
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: default_cache_ttl_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            whitelist_hosts: Vec::new(),
            request_timeout_ms: default_request_timeout_ms(),
            background_sweep: false,
        }
    }
}

impl AuthConfig {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_millis(self.cache_ttl_ms),
            sweep_interval: Duration::from_millis(self.sweep_interval_ms),
            background_sweep: self.background_sweep,
        }
    }

    pub fn whitelist(&self) -> HashSet<String> {
        self.whitelist_hosts
            .iter()
            .map(|host| host.trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Prometheus-compatible metrics backend
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BackendConfig {
    #[garde(custom(validate_backend_url))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[garde(range(min = 100, max = 300_000))]
    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend_timeout_ms() -> u64 {
    30_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_backend_timeout_ms(),
        }
    }
}

impl BackendConfig {
    /// Configured URL, else `METRICS_URL`, else the in-cluster Prometheus
    pub fn resolve_url(&self) -> String {
        self.url
            .clone()
            .or_else(|| std::env::var("METRICS_URL").ok())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct HealthConfig {
    #[garde(length(min = 1), pattern(r"^/"))]
    #[serde(default = "default_liveness_path")]
    pub liveness_path: String,

    #[garde(length(min = 1), pattern(r"^/"))]
    #[serde(default = "default_readiness_path")]
    pub readiness_path: String,
}

fn default_liveness_path() -> String {
    "/health".to_string()
}

fn default_readiness_path() -> String {
    "/health/ready".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            liveness_path: default_liveness_path(),
            readiness_path: default_readiness_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

fn validate_bind_address(value: &str, _: &()) -> garde::Result {
    value
        .parse::<std::net::IpAddr>()
        .map(|_| ())
        .map_err(|_| garde::Error::new("Invalid IP address"))
}

fn validate_backend_url(value: &Option<String>, _: &()) -> garde::Result {
    match value.as_deref() {
        None => Ok(()),
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
        Some(_) => Err(garde::Error::new("Backend URL must start with http:// or https://")),
    }
}
