use std::sync::Arc;
use std::time::Duration;

use crate::auth::cache::CacheConfig;
use crate::auth::checker::{MockOutcome, MockPermissionChecker};
use crate::client::MetricsClient;
use crate::error::MetricsError;
use crate::services::monitor::{DatabaseQuery, LaunchpadQuery, MinioQuery, RawQuery};
use crate::services::prometheus::{DatabaseType, MockQueryExecutor, TimeRange};

fn client(
    checker: &Arc<MockPermissionChecker>,
    executor: &Arc<MockQueryExecutor>,
    cache: CacheConfig,
) -> MetricsClient {
    MetricsClient::from_parts(
        Some("ns-alice".to_string()),
        cache,
        checker.clone(),
        executor.clone(),
    )
}

fn launchpad(metric: &str) -> LaunchpadQuery {
    LaunchpadQuery {
        metric: metric.to_string(),
        pod: "hello-world".to_string(),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_services_share_one_decision_per_namespace() {
    let checker = Arc::new(MockPermissionChecker::allowing());
    let executor = Arc::new(MockQueryExecutor::default());
    let client = client(&checker, &executor, CacheConfig::default());

    client.launchpad().query(&launchpad("cpu")).await.unwrap();
    client
        .database()
        .query(&DatabaseQuery {
            namespace: None,
            db_type: DatabaseType::Redis,
            metric: "cpu".to_string(),
            db_name: "cache".to_string(),
            range: TimeRange::instant(),
        })
        .await
        .unwrap();
    client
        .minio()
        .query(&MinioQuery {
            metric: "minio_bucket_usage_total_bytes".to_string(),
            bucket: "ns-alice-assets".to_string(),
            instance: "minio:9000".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    client
        .raw()
        .query(&RawQuery {
            query: "up".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(checker.access_reviews(), 1);
    assert_eq!(executor.recorded().await.len(), 4);

    let stats = client.cache_stats().await;
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 1);
}

#[tokio::test(start_paused = true)]
async fn test_denied_namespace_never_reaches_backend() {
    let checker = Arc::new(MockPermissionChecker::allowing().with_outcome("ns-bob", MockOutcome::Deny));
    let executor = Arc::new(MockQueryExecutor::default());
    let client = client(&checker, &executor, CacheConfig::default());

    for _ in 0..3 {
        let err = client
            .raw()
            .query(&RawQuery {
                namespace: Some("ns-bob".to_string()),
                query: "up".to_string(),
                range: TimeRange::instant(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MetricsError::PermissionDenied { ref namespace } if namespace == "ns-bob"));
    }

    // The denial is cached like an allow
    assert_eq!(checker.access_reviews(), 1);
    assert!(executor.recorded().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_connectivity_failure_is_retried_on_next_call() {
    let checker = Arc::new(MockPermissionChecker::new(MockOutcome::NotReady));
    let executor = Arc::new(MockQueryExecutor::default());
    let client = client(&checker, &executor, CacheConfig::default());

    let err = client.launchpad().query(&launchpad("memory")).await.unwrap_err();
    assert_eq!(err.code(), "CONNECTIVITY_ERROR");
    assert_eq!(checker.access_reviews(), 0);

    checker.set_outcome("ns-alice", MockOutcome::Allow).await;
    client.launchpad().query(&launchpad("memory")).await.unwrap();

    assert_eq!(checker.liveness_probes(), 2);
    assert_eq!(checker.access_reviews(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clear_namespace_cache_forces_recheck() {
    let checker = Arc::new(MockPermissionChecker::allowing());
    let executor = Arc::new(MockQueryExecutor::default());
    let client = client(&checker, &executor, CacheConfig::default());

    client.authenticate(None).await.unwrap();
    client.authenticate(Some("ns-bob")).await.unwrap();
    assert_eq!(checker.access_reviews(), 2);

    client.clear_namespace_cache("ns-alice").await;
    client.authenticate(None).await.unwrap();
    client.authenticate(Some("ns-bob")).await.unwrap();
    assert_eq!(checker.access_reviews(), 3);

    client.clear_cache().await;
    assert_eq!(client.cache_stats().await.size, 0);
}

#[tokio::test(start_paused = true)]
async fn test_revoked_access_is_seen_after_ttl() {
    let checker = Arc::new(MockPermissionChecker::allowing());
    let executor = Arc::new(MockQueryExecutor::default());
    let client = client(
        &checker,
        &executor,
        CacheConfig {
            ttl: Duration::from_secs(60),
            ..Default::default()
        },
    );

    client.authenticate(None).await.unwrap();
    checker.set_outcome("ns-alice", MockOutcome::Deny).await;

    // Still served from cache
    client.authenticate(None).await.unwrap();

    tokio::time::advance(Duration::from_secs(61)).await;
    let err = client.authenticate(None).await.unwrap_err();
    assert!(matches!(err, MetricsError::PermissionDenied { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_clients_do_not_share_decisions() {
    let checker = Arc::new(MockPermissionChecker::allowing());
    let executor = Arc::new(MockQueryExecutor::default());
    let first = client(&checker, &executor, CacheConfig::default());
    let second = client(&checker, &executor, CacheConfig::default());

    first.authenticate(None).await.unwrap();
    second.authenticate(None).await.unwrap();

    assert_eq!(checker.access_reviews(), 2);
    assert_eq!(first.cache_stats().await.size, 1);
    assert_eq!(second.cache_stats().await.size, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_services_join_one_check() {
    let checker = Arc::new(MockPermissionChecker::allowing().with_delay(Duration::from_millis(100)));
    let executor = Arc::new(MockQueryExecutor::default());
    let client = Arc::new(client(&checker, &executor, CacheConfig::default()));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    client.launchpad().query(&launchpad("cpu")).await.map(|_| ())
                } else {
                    client
                        .raw()
                        .query(&RawQuery {
                            query: "up".to_string(),
                            ..Default::default()
                        })
                        .await
                        .map(|_| ())
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(checker.liveness_probes(), 1);
    assert_eq!(checker.access_reviews(), 1);
    assert_eq!(executor.recorded().await.len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_background_sweeper_runs_inside_client() {
    let checker = Arc::new(MockPermissionChecker::allowing());
    let executor = Arc::new(MockQueryExecutor::default());
    let client = client(
        &checker,
        &executor,
        CacheConfig {
            ttl: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(5),
            background_sweep: true,
        },
    );

    client.authenticate(None).await.unwrap();
    tokio::time::sleep(Duration::from_secs(16)).await;

    let stats = client.cache_stats().await;
    assert_eq!(stats.size, 0);
    assert_eq!(stats.expired, 1);
}
