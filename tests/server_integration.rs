use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use metrics_gate::auth::{CacheConfig, MockOutcome, MockPermissionChecker};
use metrics_gate::config::HealthConfig;
use metrics_gate::error::MetricsError;
use metrics_gate::health::HealthManager;
use metrics_gate::services::prometheus::{MockQueryExecutor, QueryResponse};
use metrics_gate::{create_router, AppState, ClientFactory, ClientRegistry, MetricsClient};

/// Builds mock-backed clients; the decoded kubeconfig text is the default namespace
struct MockFactory {
    checker: Arc<MockPermissionChecker>,
    executor: Arc<MockQueryExecutor>,
}

#[async_trait]
impl ClientFactory for MockFactory {
    async fn create(&self, kubeconfig: &str) -> Result<MetricsClient, MetricsError> {
        if kubeconfig.trim().is_empty() {
            return Err(MetricsError::InvalidCredentials("empty kubeconfig".to_string()));
        }
        Ok(MetricsClient::from_parts(
            Some(kubeconfig.trim().to_string()),
            CacheConfig::default(),
            self.checker.clone(),
            self.executor.clone(),
        ))
    }
}

struct TestApp {
    router: Router,
    checker: Arc<MockPermissionChecker>,
    executor: Arc<MockQueryExecutor>,
}

fn test_app(checker: MockPermissionChecker) -> TestApp {
    let checker = Arc::new(checker);
    let executor = Arc::new(MockQueryExecutor::new(QueryResponse::success(
        "matrix",
        vec![json!({"metric": {"pod": "web-0"}, "values": [[1700000000, "0.5"]]})],
    )));

    let factory = Arc::new(MockFactory {
        checker: checker.clone(),
        executor: executor.clone(),
    });
    let state = AppState {
        registry: Arc::new(ClientRegistry::new(factory, 16)),
        health: HealthManager::new(),
    };

    TestApp {
        router: create_router(state, &HealthConfig::default()),
        checker,
        executor,
    }
}

fn credentials(namespace: &str) -> String {
    format!("Bearer {}", STANDARD.encode(namespace))
}

fn post(path: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(path).header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_credentials_is_unauthorized() {
    let app = test_app(MockPermissionChecker::allowing());

    let response = app
        .router
        .oneshot(post("/api/v1/monitor/query", None, json!({"query": "up"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(app.checker.liveness_probes(), 0);
}

#[tokio::test]
async fn test_undecodable_credentials_is_unauthorized() {
    let app = test_app(MockPermissionChecker::allowing());

    let response = app
        .router
        .oneshot(post("/api/v1/monitor/query", Some("Bearer %%%"), json!({"query": "up"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_launchpad_query_succeeds() {
    let app = test_app(MockPermissionChecker::allowing());
    let auth = credentials("ns-alice");

    let response = app
        .router
        .oneshot(post(
            "/api/v1/monitor/launchpad",
            Some(&auth),
            json!({
                "metric": "cpu",
                "pod": "web",
                "range": {"start": "1700000000", "end": "1700003600", "step": "60"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["resultType"], "matrix");

    let recorded = app.executor.recorded().await;
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].query.contains("ns-alice"));
    assert!(recorded[0].range.is_range());
}

#[tokio::test]
async fn test_denied_namespace_is_forbidden() {
    let app = test_app(MockPermissionChecker::allowing().with_outcome("ns-bob", MockOutcome::Deny));
    let auth = credentials("ns-alice");

    let response = app
        .router
        .oneshot(post(
            "/api/v1/monitor/database",
            Some(&auth),
            json!({
                "namespace": "ns-bob",
                "db_type": "postgresql",
                "metric": "cpu",
                "db_name": "orders"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "PERMISSION_DENIED");
    assert!(app.executor.recorded().await.is_empty());
}

#[tokio::test]
async fn test_control_plane_unavailable_is_service_unavailable() {
    let app = test_app(MockPermissionChecker::new(MockOutcome::NotReady));
    let auth = credentials("ns-alice");

    let response = app
        .router
        .oneshot(post("/api/v1/monitor/query", Some(&auth), json!({"query": "up"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "CONNECTIVITY_ERROR");
}

#[tokio::test]
async fn test_unknown_metric_is_bad_request() {
    let app = test_app(MockPermissionChecker::allowing());
    let auth = credentials("ns-alice");

    let response = app
        .router
        .oneshot(post(
            "/api/v1/monitor/minio",
            Some(&auth),
            json!({"metric": "not_a_metric", "bucket": "b", "instance": "i"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "UNSUPPORTED_QUERY");
}

#[tokio::test]
async fn test_pod_name_cannot_inject_selectors() {
    let app = test_app(MockPermissionChecker::allowing());
    let auth = credentials("ns-alice");

    let response = app
        .router
        .oneshot(post(
            "/api/v1/monitor/launchpad",
            Some(&auth),
            json!({
                "metric": "cpu",
                "pod": "x\"}) by (pod) or sum(up{namespace=\"ns-victim"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "UNSUPPORTED_QUERY");
    assert!(app.executor.recorded().await.is_empty());
}

#[tokio::test]
async fn test_cache_persists_across_requests_and_can_be_cleared() {
    let app = test_app(MockPermissionChecker::allowing());
    let auth = credentials("ns-alice");

    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(post("/api/v1/monitor/query", Some(&auth), json!({"query": "up"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(app.checker.access_reviews(), 1);

    let stats = app
        .router
        .clone()
        .oneshot(
            Request::get("/api/v1/monitor/cache")
                .header("authorization", &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(stats.status(), StatusCode::OK);
    let stats = json_body(stats).await;
    assert_eq!(stats["size"], 1);
    assert_eq!(stats["hits"], 2);
    assert_eq!(stats["entries"][0]["namespace"], "ns-alice");

    let cleared = app
        .router
        .clone()
        .oneshot(
            Request::delete("/api/v1/monitor/cache?namespace=ns-alice")
                .header("authorization", &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(cleared.status(), StatusCode::NO_CONTENT);

    app.router
        .oneshot(post("/api/v1/monitor/query", Some(&auth), json!({"query": "up"})))
        .await
        .unwrap();
    assert_eq!(app.checker.access_reviews(), 2);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app(MockPermissionChecker::allowing());

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"OK");

    // Starting is reported as ready during the startup grace period
    let response = app
        .router
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_unavailable_without_recorder() {
    let app = test_app(MockPermissionChecker::allowing());

    let response = app
        .router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_responses_carry_trace_id() {
    let app = test_app(MockPermissionChecker::allowing());

    let response = app
        .router
        .oneshot(
            Request::get("/health")
                .header("x-trace-id", "trace-from-dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-trace-id"], "trace-from-dashboard");
}
