//! Per-credential client registry
//!
//! Each distinct kubeconfig gets its own [`MetricsClient`] and therefore its
//! own authorization cache. Clients are kept in an LRU bounded by
//! `server.max_clients`; an evicted client is rebuilt with an empty cache on
//! the caller's next request.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::{ClientOptions, MetricsClient};
use crate::error::MetricsError;

/// Builds a client for a decoded kubeconfig
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(&self, kubeconfig: &str) -> Result<MetricsClient, MetricsError>;
}

/// Factory backed by the real control plane and metrics backend
pub struct KubeClientFactory {
    options: ClientOptions,
}

impl KubeClientFactory {
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ClientFactory for KubeClientFactory {
    async fn create(&self, kubeconfig: &str) -> Result<MetricsClient, MetricsError> {
        MetricsClient::from_kubeconfig(kubeconfig, &self.options).await
    }
}

pub struct ClientRegistry {
    factory: Arc<dyn ClientFactory>,
    clients: Mutex<LruCache<String, Arc<MetricsClient>>>,
}

impl ClientRegistry {
    pub fn new(factory: Arc<dyn ClientFactory>, max_clients: usize) -> Self {
        let capacity = NonZeroUsize::new(max_clients).unwrap_or(NonZeroUsize::MIN);
        Self {
            factory,
            clients: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Client for `kubeconfig`, creating it on first use
    ///
    /// The lock is not held while a client is built. When two first requests
    /// race, the client inserted first wins and the other is dropped.
    pub async fn get_or_create(&self, kubeconfig: &str) -> Result<Arc<MetricsClient>, MetricsError> {
        if let Some(client) = self.clients.lock().await.get(kubeconfig) {
            return Ok(client.clone());
        }

        let created = Arc::new(self.factory.create(kubeconfig).await?);

        let mut clients = self.clients.lock().await;
        if let Some(existing) = clients.get(kubeconfig) {
            debug!("Concurrent client creation, keeping the first one");
            return Ok(existing.clone());
        }

        if let Some((_, evicted)) = clients.push(kubeconfig.to_string(), created.clone()) {
            info!(
                default_namespace = ?evicted.default_namespace(),
                "Evicted least recently used metrics client"
            );
        }

        Ok(created)
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}
