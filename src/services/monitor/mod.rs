//! Metrics query façade
//!
//! Each service follows the same steps: resolve the namespace, authenticate
//! it through the authorization cache, render the PromQL template and submit
//! it to the backend. Nothing is retried.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

use crate::auth::cache::AuthorizationCache;
use crate::auth::namespace::NamespaceResolver;
use crate::error::MetricsError;
use crate::observability::metrics::{record_backend_query, RequestStatus};
use crate::services::prometheus::{QueryExecutor, QueryResponse, TimeRange};

pub mod database;
pub mod launchpad;
pub mod minio;
pub mod raw;

pub use database::{DatabaseQuery, DatabaseService};
pub use launchpad::{LaunchpadQuery, LaunchpadService};
pub use minio::{MinioQuery, MinioService};
pub use raw::{RawQuery, RawService};

/// Shared pipeline behind every query service
pub struct MonitorGate {
    resolver: NamespaceResolver,
    cache: AuthorizationCache,
    executor: Arc<dyn QueryExecutor>,
}

impl MonitorGate {
    pub fn new(resolver: NamespaceResolver, cache: AuthorizationCache, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            resolver,
            cache,
            executor,
        }
    }

    pub fn cache(&self) -> &AuthorizationCache {
        &self.cache
    }

    pub fn resolver(&self) -> &NamespaceResolver {
        &self.resolver
    }

    /// Resolve, authenticate, render with the resolved namespace, execute
    #[instrument(skip_all, fields(service = service, namespace = tracing::field::Empty))]
    pub async fn run<F>(
        &self,
        service: &'static str,
        namespace: Option<&str>,
        range: &TimeRange,
        render: F,
    ) -> Result<QueryResponse, MetricsError>
    where
        F: FnOnce(&str) -> Result<String, MetricsError>,
    {
        let namespace = self.resolver.resolve(namespace)?;
        tracing::Span::current().record("namespace", namespace.as_str());

        self.cache.authenticate(&namespace).await?;

        let query = render(&namespace)?;
        debug!(range = range.is_range(), "Executing rendered query");

        let started = Instant::now();
        let result = self.executor.execute(&query, range).await;

        let status = if result.is_ok() {
            RequestStatus::Success
        } else {
            RequestStatus::Error
        };
        record_backend_query(service, status, started.elapsed());

        result
    }
}
