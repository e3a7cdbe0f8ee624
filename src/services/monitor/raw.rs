use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::MonitorGate;
use crate::error::MetricsError;
use crate::services::prometheus::{QueryResponse, TimeRange};

/// Caller-supplied PromQL, passed through unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQuery {
    #[serde(default)]
    pub namespace: Option<String>,
    pub query: String,
    #[serde(default)]
    pub range: TimeRange,
}

#[derive(Clone)]
pub struct RawService {
    gate: Arc<MonitorGate>,
}

impl RawService {
    pub fn new(gate: Arc<MonitorGate>) -> Self {
        Self { gate }
    }

    pub async fn query(&self, params: &RawQuery) -> Result<QueryResponse, MetricsError> {
        self.gate
            .run("raw", params.namespace.as_deref(), &params.range, |_| {
                if params.query.trim().is_empty() {
                    return Err(MetricsError::UnsupportedQuery("empty query".to_string()));
                }
                Ok(params.query.clone())
            })
            .await
    }
}
