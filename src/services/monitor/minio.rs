use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::MonitorGate;
use crate::error::MetricsError;
use crate::services::prometheus::{minio_query, QueryResponse, TimeRange};

/// Object storage (minio bucket) metrics request
///
/// The namespace gates access but does not appear in the query; buckets are
/// addressed by bucket name and minio instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinioQuery {
    #[serde(default)]
    pub namespace: Option<String>,
    pub metric: String,
    pub bucket: String,
    pub instance: String,
    #[serde(default)]
    pub range: TimeRange,
}

#[derive(Clone)]
pub struct MinioService {
    gate: Arc<MonitorGate>,
}

impl MinioService {
    pub fn new(gate: Arc<MonitorGate>) -> Self {
        Self { gate }
    }

    pub async fn query(&self, params: &MinioQuery) -> Result<QueryResponse, MetricsError> {
        self.gate
            .run("minio", params.namespace.as_deref(), &params.range, |_| {
                minio_query(&params.metric, &params.bucket, &params.instance)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::checker::MockPermissionChecker;
    use crate::services::monitor::tests::gate;
    use crate::services::prometheus::MockQueryExecutor;

    #[tokio::test]
    async fn test_minio_query() {
        let checker = Arc::new(MockPermissionChecker::allowing());
        let executor = Arc::new(MockQueryExecutor::default());
        let service = MinioService::new(gate(&checker, &executor, Some("ns-alice")));

        let params = MinioQuery {
            metric: "minio_bucket_traffic_sent_bytes".to_string(),
            bucket: "ns-alice-photos".to_string(),
            instance: "object-storage:9000".to_string(),
            ..Default::default()
        };
        service.query(&params).await.unwrap();

        let recorded = executor.recorded().await;
        assert_eq!(
            recorded[0].query,
            r#"sum(minio_bucket_traffic_sent_bytes{bucket="ns-alice-photos", instance="object-storage:9000"}) by (bucket, instance, job, namespace)"#
        );
        assert_eq!(checker.access_reviews(), 1);
    }
}
