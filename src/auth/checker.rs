//! Permission checks against the cluster control plane
//!
//! A check is two calls: a liveness probe (`GET /readyz`, which must answer
//! with the literal body `ok`) followed by a single self-access-review for a
//! fixed resource/verb scoped to the namespace being checked.
//!
//! A negative review is a normal result (`Ok(false)`), not an error. Errors are
//! reserved for the control plane being unreachable or the review call itself
//! failing. Nothing here retries; that policy belongs to the caller.

use async_trait::async_trait;
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SelfSubjectAccessReview, SelfSubjectAccessReviewSpec,
};
use kube::{api::PostParams, Api, Client};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Body the control plane returns from `/readyz` when it is ready
pub const READY_BODY: &str = "ok";

/// Errors raised by a permission check
///
/// Cloneable because a single in-flight check is shared by every caller that
/// joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// Liveness probe failed, returned an unexpected body, or timed out
    #[error("control plane is not reachable while checking namespace {namespace}: {reason}")]
    Connectivity { namespace: String, reason: String },

    /// The access review call itself failed
    #[error("access review failed for namespace {namespace}: {reason}")]
    Authorization { namespace: String, reason: String },

    /// The check never settled normally (task panicked or was cancelled)
    #[error("permission check for namespace {namespace} was aborted: {reason}")]
    Aborted { namespace: String, reason: String },
}

/// Decides whether the current credentials may read metrics for a namespace
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Returns `Ok(true)` if access is allowed, `Ok(false)` if it is denied
    async fn check_access(&self, namespace: &str) -> Result<bool, CheckError>;
}

/// Resource/verb combination reviewed on behalf of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReviewTarget {
    pub group: String,
    pub resource: String,
    pub verb: String,
}

impl Default for AccessReviewTarget {
    fn default() -> Self {
        Self {
            group: String::new(),
            resource: "pods".to_string(),
            verb: "get".to_string(),
        }
    }
}

impl AccessReviewTarget {
    /// Build the self-access-review submitted for `namespace`
    pub fn review_for(&self, namespace: &str) -> SelfSubjectAccessReview {
        SelfSubjectAccessReview {
            metadata: Default::default(),
            spec: SelfSubjectAccessReviewSpec {
                resource_attributes: Some(ResourceAttributes {
                    namespace: Some(namespace.to_string()),
                    group: Some(self.group.clone()),
                    resource: Some(self.resource.clone()),
                    verb: Some(self.verb.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            status: None,
        }
    }
}

/// Permission checker backed by a Kubernetes client
///
/// The client is expected to already point at a trusted control plane; see
/// [`crate::auth::credentials::Credentials::kube_config`] for the whitelist
/// rewrite applied before the client is built.
#[derive(Clone)]
pub struct KubePermissionChecker {
    client: Client,
    target: AccessReviewTarget,
    request_timeout: Duration,
}

impl KubePermissionChecker {
    pub fn new(client: Client, request_timeout: Duration) -> Self {
        Self {
            client,
            target: AccessReviewTarget::default(),
            request_timeout,
        }
    }

    pub fn with_target(mut self, target: AccessReviewTarget) -> Self {
        self.target = target;
        self
    }

    async fn probe_liveness(&self, namespace: &str) -> Result<(), CheckError> {
        let connectivity = |reason: String| CheckError::Connectivity {
            namespace: namespace.to_string(),
            reason,
        };

        let request = http::Request::get("/readyz")
            .body(Vec::new())
            .map_err(|e| connectivity(e.to_string()))?;

        let body = tokio::time::timeout(self.request_timeout, self.client.request_text(request))
            .await
            .map_err(|_| connectivity(format!("readyz timed out after {:?}", self.request_timeout)))?
            .map_err(|e| connectivity(e.to_string()))?;

        if body != READY_BODY {
            return Err(connectivity(format!("readyz returned {:?}", body)));
        }

        Ok(())
    }

    async fn review_access(&self, namespace: &str) -> Result<bool, CheckError> {
        let authorization = |reason: String| CheckError::Authorization {
            namespace: namespace.to_string(),
            reason,
        };

        let api: Api<SelfSubjectAccessReview> = Api::all(self.client.clone());
        let review = self.target.review_for(namespace);

        let result = tokio::time::timeout(
            self.request_timeout,
            api.create(&PostParams::default(), &review),
        )
        .await
        .map_err(|_| authorization(format!("access review timed out after {:?}", self.request_timeout)))?
        .map_err(|e| authorization(e.to_string()))?;

        let status = result
            .status
            .ok_or_else(|| authorization("access review returned no status".to_string()))?;

        if let Some(error) = status.evaluation_error.as_deref() {
            debug!(namespace = %namespace, error = %error, "Access review reported an evaluation error");
        }

        Ok(status.allowed)
    }
}

#[async_trait]
impl PermissionChecker for KubePermissionChecker {
    async fn check_access(&self, namespace: &str) -> Result<bool, CheckError> {
        self.probe_liveness(namespace).await?;
        let allowed = self.review_access(namespace).await?;

        debug!(
            namespace = %namespace,
            resource = %self.target.resource,
            verb = %self.target.verb,
            allowed = %allowed,
            "Access review completed"
        );

        Ok(allowed)
    }
}

/// Scripted result for [`MockPermissionChecker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    Allow,
    Deny,
    /// Liveness probe answers with something other than `ok`
    NotReady,
    /// Access review call fails
    ReviewError,
    /// The check panics
    Panic,
}

/// Mock permission checker for tests and local development
///
/// Counts liveness probes and access reviews separately so tests can assert
/// exactly how many upstream round-trips a scenario caused.
pub struct MockPermissionChecker {
    default_outcome: MockOutcome,
    outcomes: RwLock<HashMap<String, MockOutcome>>,
    delay: Duration,
    probes: AtomicUsize,
    reviews: AtomicUsize,
}

impl MockPermissionChecker {
    pub fn new(default_outcome: MockOutcome) -> Self {
        Self {
            default_outcome,
            outcomes: RwLock::new(HashMap::new()),
            delay: Duration::ZERO,
            probes: AtomicUsize::new(0),
            reviews: AtomicUsize::new(0),
        }
    }

    pub fn allowing() -> Self {
        Self::new(MockOutcome::Allow)
    }

    pub fn denying() -> Self {
        Self::new(MockOutcome::Deny)
    }

    pub fn with_outcome(mut self, namespace: &str, outcome: MockOutcome) -> Self {
        self.outcomes.get_mut().insert(namespace.to_string(), outcome);
        self
    }

    /// Simulated round-trip latency, applied to the probe
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn set_outcome(&self, namespace: &str, outcome: MockOutcome) {
        self.outcomes.write().await.insert(namespace.to_string(), outcome);
    }

    pub fn liveness_probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn access_reviews(&self) -> usize {
        self.reviews.load(Ordering::SeqCst)
    }
}

impl Default for MockPermissionChecker {
    fn default() -> Self {
        Self::allowing()
    }
}

#[async_trait]
impl PermissionChecker for MockPermissionChecker {
    async fn check_access(&self, namespace: &str) -> Result<bool, CheckError> {
        let outcome = self
            .outcomes
            .read()
            .await
            .get(namespace)
            .copied()
            .unwrap_or(self.default_outcome);

        self.probes.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if outcome == MockOutcome::NotReady {
            warn!(namespace = %namespace, "Mock control plane not ready");
            return Err(CheckError::Connectivity {
                namespace: namespace.to_string(),
                reason: "readyz returned \"not-ok\"".to_string(),
            });
        }

        self.reviews.fetch_add(1, Ordering::SeqCst);

        match outcome {
            MockOutcome::Allow => Ok(true),
            MockOutcome::Panic => panic!("mock permission checker panicked for {namespace}"),
            MockOutcome::ReviewError => Err(CheckError::Authorization {
                namespace: namespace.to_string(),
                reason: "mock access review failed".to_string(),
            }),
            MockOutcome::Deny | MockOutcome::NotReady => Ok(false),
        }
    }
}
