use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::MonitorGate;
use crate::error::MetricsError;
use crate::services::prometheus::{database_query, DatabaseType, QueryResponse, TimeRange};

/// Managed database metrics request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseQuery {
    #[serde(default)]
    pub namespace: Option<String>,
    pub db_type: DatabaseType,
    pub metric: String,
    /// Database cluster name
    pub db_name: String,
    #[serde(default)]
    pub range: TimeRange,
}

#[derive(Clone)]
pub struct DatabaseService {
    gate: Arc<MonitorGate>,
}

impl DatabaseService {
    pub fn new(gate: Arc<MonitorGate>) -> Self {
        Self { gate }
    }

    pub async fn query(&self, params: &DatabaseQuery) -> Result<QueryResponse, MetricsError> {
        self.gate
            .run("database", params.namespace.as_deref(), &params.range, |namespace| {
                database_query(params.db_type, &params.metric, namespace, &params.db_name)
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
    use serde_json::json;

    #[tokio::test]
    async fn test_database_query() {
        let checker = Arc::new(MockPermissionChecker::allowing());
        let executor = Arc::new(MockQueryExecutor::default());
        let service = DatabaseService::new(gate(&checker, &executor, Some("ns-alice")));

        let params: DatabaseQuery = serde_json::from_value(json!({
            "db_type": "postgresql",
            "metric": "connections",
            "db_name": "orders",
        }))
        .unwrap();

        service.query(&params).await.unwrap();

        let recorded = executor.recorded().await;
        assert_eq!(
            recorded[0].query,
            r#"sum(pg_stat_database_numbackends{namespace=~"ns-alice", app_kubernetes_io_instance=~"orders"})"#
        );
        assert!(!recorded[0].range.is_range());
    }

    #[tokio::test]
    async fn test_metric_missing_for_database_type() {
        let checker = Arc::new(MockPermissionChecker::allowing());
        let executor = Arc::new(MockQueryExecutor::default());
        let service = DatabaseService::new(gate(&checker, &executor, Some("ns-alice")));

        let params = DatabaseQuery {
            namespace: None,
            db_type: DatabaseType::Kafka,
            metric: "uptime".to_string(),
            db_name: "events".to_string(),
            range: TimeRange::instant(),
        };

        assert!(matches!(
            service.query(&params).await,
            Err(MetricsError::UnsupportedQuery(ref what)) if what == "kafka/uptime"
        ));
    }
}
