//! Query execution against the Prometheus-compatible metrics backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::MetricsError;
use crate::logging::sanitization::sanitize_log_message;

pub mod templates;

pub use templates::{database_query, launchpad_query, minio_query, DatabaseType};

const INSTANT_QUERY_PATH: &str = "/api/v1/query";
const RANGE_QUERY_PATH: &str = "/api/v1/query_range";
const MAX_ERROR_BODY: usize = 512;

/// Time window of a query
///
/// Without `start` the query is evaluated at a single instant (`time`, or the
/// backend's "now"). With `start` it becomes a range query; `end` and `step`
/// are only forwarded when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl TimeRange {
    pub fn instant() -> Self {
        Self::default()
    }

    pub fn at(time: impl Into<String>) -> Self {
        Self {
            time: Some(time.into()),
            ..Default::default()
        }
    }

    pub fn range(start: impl Into<String>, end: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            step: Some(step.into()),
            time: None,
        }
    }

    pub fn is_range(&self) -> bool {
        self.start.is_some()
    }
}

/// Endpoint path and form fields for a query
pub fn form_params(query: &str, range: &TimeRange) -> (&'static str, Vec<(&'static str, String)>) {
    let mut params = vec![("query", query.to_string())];

    match &range.start {
        None => {
            if let Some(time) = &range.time {
                params.push(("time", time.clone()));
            }
            (INSTANT_QUERY_PATH, params)
        }
        Some(start) => {
            params.push(("start", start.clone()));
            if let Some(end) = &range.end {
                params.push(("end", end.clone()));
            }
            if let Some(step) = &range.step {
                params.push(("step", step.clone()));
            }
            (RANGE_QUERY_PATH, params)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    pub data: QueryData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<serde_json::Value>,
}

impl QueryResponse {
    pub fn success(result_type: &str, result: Vec<serde_json::Value>) -> Self {
        Self {
            status: "success".to_string(),
            data: QueryData {
                result_type: result_type.to_string(),
                result,
            },
        }
    }
}

/// Runs rendered PromQL against the metrics backend
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str, range: &TimeRange) -> Result<QueryResponse, MetricsError>;
}

/// Executor posting form-encoded queries over HTTP
#[derive(Clone, Debug)]
pub struct HttpQueryExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQueryExecutor {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MetricsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetricsError::QueryExecution(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl QueryExecutor for HttpQueryExecutor {
    async fn execute(&self, query: &str, range: &TimeRange) -> Result<QueryResponse, MetricsError> {
        let (path, params) = form_params(query, range);
        let url = format!("{}{}", self.base_url, path);

        debug!(path = %path, range = range.is_range(), "Submitting metrics query");

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| MetricsError::QueryExecution(format!("request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            let body = sanitize_log_message(&body);

            warn!(status = %status, path = %path, body = %body, "Metrics backend rejected query");
            return Err(MetricsError::QueryExecution(format!(
                "backend returned {}: {}",
                status, body
            )));
        }

        response
            .json::<QueryResponse>()
            .await
            .map_err(|e| MetricsError::QueryExecution(format!("invalid backend response: {}", e)))
    }
}

/// A query received by [`MockQueryExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub query: String,
    pub range: TimeRange,
}

/// Mock executor for tests
///
/// Records every query and answers with a fixed response, or fails with
/// [`MetricsError::QueryExecution`] when constructed with [`MockQueryExecutor::failing`].
pub struct MockQueryExecutor {
    response: Option<QueryResponse>,
    recorded: Mutex<Vec<RecordedQuery>>,
}

impl MockQueryExecutor {
    pub fn new(response: QueryResponse) -> Self {
        Self {
            response: Some(response),
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub async fn recorded(&self) -> Vec<RecordedQuery> {
        self.recorded.lock().await.clone()
    }
}

impl Default for MockQueryExecutor {
    fn default() -> Self {
        Self::new(QueryResponse::success("vector", Vec::new()))
    }
}

#[async_trait]
impl QueryExecutor for MockQueryExecutor {
    async fn execute(&self, query: &str, range: &TimeRange) -> Result<QueryResponse, MetricsError> {
        self.recorded.lock().await.push(RecordedQuery {
            query: query.to_string(),
            range: range.clone(),
        });

        self.response
            .clone()
            .ok_or_else(|| MetricsError::QueryExecution("mock backend unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Form, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_instant_query_params() {
        let (path, params) = form_params("up", &TimeRange::instant());
        assert_eq!(path, "/api/v1/query");
        assert_eq!(params, vec![("query", "up".to_string())]);

        let (path, params) = form_params("up", &TimeRange::at("1700000000"));
        assert_eq!(path, "/api/v1/query");
        assert_eq!(params, vec![("query", "up".to_string()), ("time", "1700000000".to_string())]);
    }

    #[test]
    fn test_range_query_params() {
        let (path, params) = form_params("up", &TimeRange::range("100", "200", "15s"));
        assert_eq!(path, "/api/v1/query_range");
        assert_eq!(
            params,
            vec![
                ("query", "up".to_string()),
                ("start", "100".to_string()),
                ("end", "200".to_string()),
                ("step", "15s".to_string()),
            ]
        );
    }

    #[test]
    fn test_range_query_omits_missing_fields() {
        let range = TimeRange {
            start: Some("100".to_string()),
            time: Some("150".to_string()),
            ..Default::default()
        };
        let (path, params) = form_params("up", &range);

        assert_eq!(path, "/api/v1/query_range");
        assert_eq!(params, vec![("query", "up".to_string()), ("start", "100".to_string())]);
    }

    #[test]
    fn test_response_parsing() {
        let body = json!({
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [{"metric": {"pod": "web-0"}, "values": [[1700000000, "0.5"]]}]
            }
        });

        let response: QueryResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.data.result_type, "matrix");
        assert_eq!(response.data.result.len(), 1);
        assert_eq!(response.data.result[0]["metric"]["pod"], "web-0");
    }

    /// Backend echoing the submitted form fields back as the result
    async fn spawn_backend() -> String {
        async fn echo(kind: &'static str, form: HashMap<String, String>) -> Json<serde_json::Value> {
            Json(json!({
                "status": "success",
                "data": { "resultType": kind, "result": [form] }
            }))
        }

        let app = Router::new()
            .route("/api/v1/query", post(|Form(form): Form<HashMap<String, String>>| echo("vector", form)))
            .route("/api/v1/query_range", post(|Form(form): Form<HashMap<String, String>>| echo("matrix", form)))
            .route("/broken/api/v1/query", post(|| async { (StatusCode::BAD_REQUEST, "bad_data: parse error") }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_executor_instant_query() {
        let base_url = spawn_backend().await;
        let executor = HttpQueryExecutor::new(&format!("{}/", base_url), Duration::from_secs(5)).unwrap();

        let response = executor.execute("up{job=\"api\"}", &TimeRange::at("42")).await.unwrap();

        assert_eq!(response.data.result_type, "vector");
        assert_eq!(response.data.result[0]["query"], "up{job=\"api\"}");
        assert_eq!(response.data.result[0]["time"], "42");
        assert!(response.data.result[0].get("start").is_none());
    }

    #[tokio::test]
    async fn test_http_executor_range_query() {
        let base_url = spawn_backend().await;
        let executor = HttpQueryExecutor::new(&base_url, Duration::from_secs(5)).unwrap();

        let range = TimeRange {
            start: Some("100".to_string()),
            step: Some("60".to_string()),
            ..Default::default()
        };
        let response = executor.execute("up", &range).await.unwrap();

        assert_eq!(response.data.result_type, "matrix");
        assert_eq!(response.data.result[0]["start"], "100");
        assert_eq!(response.data.result[0]["step"], "60");
        assert!(response.data.result[0].get("end").is_none());
    }

    #[tokio::test]
    async fn test_http_executor_non_success_status() {
        let base_url = spawn_backend().await;
        let executor = HttpQueryExecutor::new(&format!("{}/broken", base_url), Duration::from_secs(5)).unwrap();

        let err = executor.execute("up", &TimeRange::instant()).await.unwrap_err();
        match err {
            MetricsError::QueryExecution(message) => {
                assert!(message.contains("400"));
                assert!(message.contains("parse error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_executor_unreachable_backend() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let executor = HttpQueryExecutor::new(&format!("http://{}", addr), Duration::from_secs(1)).unwrap();
        let err = executor.execute("up", &TimeRange::instant()).await.unwrap_err();

        assert!(matches!(err, MetricsError::QueryExecution(_)));
    }

    #[tokio::test]
    async fn test_mock_executor_records_queries() {
        let executor = MockQueryExecutor::default();
        executor.execute("up", &TimeRange::at("1")).await.unwrap();

        let recorded = executor.recorded().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].query, "up");
        assert_eq!(recorded[0].range.time.as_deref(), Some("1"));

        let failing = MockQueryExecutor::failing();
        assert!(failing.execute("up", &TimeRange::instant()).await.is_err());
    }
}
