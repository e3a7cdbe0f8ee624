use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::MonitorGate;
use crate::error::MetricsError;
use crate::services::prometheus::{launchpad_query, QueryResponse, TimeRange};

/// Compute workload (launchpad application) metrics request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchpadQuery {
    #[serde(default)]
    pub namespace: Option<String>,
    /// `cpu`, `memory`, `average_cpu`, `average_memory` or `storage`
    pub metric: String,
    /// Pod name prefix of the workload
    pub pod: String,
    /// Volume claim matched by the `storage` metric
    #[serde(default)]
    pub pvc: Option<String>,
    #[serde(default)]
    pub range: TimeRange,
}

#[derive(Clone)]
pub struct LaunchpadService {
    gate: Arc<MonitorGate>,
}

impl LaunchpadService {
    pub fn new(gate: Arc<MonitorGate>) -> Self {
        Self { gate }
    }

    pub async fn query(&self, params: &LaunchpadQuery) -> Result<QueryResponse, MetricsError> {
        self.gate
            .run("launchpad", params.namespace.as_deref(), &params.range, |namespace| {
                launchpad_query(&params.metric, namespace, &params.pod, params.pvc.as_deref())
            })
            .await
    }
}
