//! Caller-owned composition root
//!
//! A [`MetricsClient`] is built from one set of credentials and owns exactly
//! one authorization cache. Two clients never share decisions.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::auth::cache::{AuthorizationCache, CacheConfig, CacheStats};
use crate::auth::checker::{KubePermissionChecker, PermissionChecker};
use crate::auth::credentials::Credentials;
use crate::auth::namespace::NamespaceResolver;
use crate::config::{AppConfig, DEFAULT_BACKEND_URL};
use crate::error::MetricsError;
use crate::services::monitor::{DatabaseService, LaunchpadService, MinioService, MonitorGate, RawService};
use crate::services::prometheus::{HttpQueryExecutor, QueryExecutor};

/// Settings shared by every client the gateway builds
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub cache: CacheConfig,
    /// Control-plane hosts used as-is; anything else goes to the in-cluster API server
    pub whitelist_hosts: HashSet<String>,
    /// Bound on each control-plane call
    pub request_timeout: Duration,
    pub backend_url: String,
    pub backend_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            whitelist_hosts: HashSet::new(),
            request_timeout: Duration::from_secs(5),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            backend_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cache: config.auth.cache_config(),
            whitelist_hosts: config.auth.whitelist(),
            request_timeout: config.auth.request_timeout(),
            backend_url: config.backend.resolve_url(),
            backend_timeout: config.backend.timeout(),
        }
    }
}

/// Install the process-wide rustls crypto provider unless one is set
///
/// kube's TLS stack pulls in more than one rustls backend, so none is picked
/// automatically. Safe to call repeatedly.
pub fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Err means another thread installed one first
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    }
}

pub struct MetricsClient {
    gate: Arc<MonitorGate>,
    launchpad: LaunchpadService,
    database: DatabaseService,
    minio: MinioService,
    raw: RawService,
    sweeper: Option<JoinHandle<()>>,
}

impl MetricsClient {
    /// Build a client from a caller's kubeconfig
    pub async fn from_kubeconfig(yaml: &str, options: &ClientOptions) -> Result<Self, MetricsError> {
        install_crypto_provider();

        let credentials = Credentials::from_yaml(yaml)?;
        let kube_config = credentials
            .kube_config(&options.whitelist_hosts, options.request_timeout)
            .await?;

        let client = kube::Client::try_from(kube_config)
            .map_err(|e| MetricsError::InvalidCredentials(e.to_string()))?;

        let checker = Arc::new(KubePermissionChecker::new(client, options.request_timeout));
        let executor = Arc::new(HttpQueryExecutor::new(&options.backend_url, options.backend_timeout)?);

        info!(
            default_namespace = ?credentials.default_namespace(),
            backend = %options.backend_url,
            "Metrics client created"
        );

        Ok(Self::from_parts(
            credentials.default_namespace(),
            options.cache.clone(),
            checker,
            executor,
        ))
    }

    /// Assemble a client from explicit parts
    ///
    /// Must be called inside a Tokio runtime when `cache.background_sweep` is set.
    pub fn from_parts(
        default_namespace: Option<String>,
        cache: CacheConfig,
        checker: Arc<dyn PermissionChecker>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        let cache = AuthorizationCache::new(cache, checker);
        let sweeper = cache.config().background_sweep.then(|| cache.spawn_sweeper());

        let gate = Arc::new(MonitorGate::new(
            NamespaceResolver::new(default_namespace),
            cache,
            executor,
        ));

        Self {
            launchpad: LaunchpadService::new(gate.clone()),
            database: DatabaseService::new(gate.clone()),
            minio: MinioService::new(gate.clone()),
            raw: RawService::new(gate.clone()),
            gate,
            sweeper,
        }
    }

    pub fn launchpad(&self) -> &LaunchpadService {
        &self.launchpad
    }

    pub fn database(&self) -> &DatabaseService {
        &self.database
    }

    pub fn minio(&self) -> &MinioService {
        &self.minio
    }

    pub fn raw(&self) -> &RawService {
        &self.raw
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.gate.resolver().default_namespace()
    }

    /// Gate a namespace without running a query
    pub async fn authenticate(&self, namespace: Option<&str>) -> Result<String, MetricsError> {
        let namespace = self.gate.resolver().resolve(namespace)?;
        self.gate.cache().authenticate(&namespace).await?;
        Ok(namespace)
    }

    pub async fn clear_cache(&self) {
        self.gate.cache().clear_cache().await;
    }

    pub async fn clear_namespace_cache(&self, namespace: &str) {
        self.gate.cache().clear_namespace_cache(namespace).await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.gate.cache().cache_stats().await
    }
}

impl Drop for MetricsClient {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}
