//! Per-namespace authorization cache
//!
//! Every metrics query is gated by [`AuthorizationCache::authenticate`]. The
//! cache memoizes the control plane's decision for each namespace for a
//! configurable TTL and collapses concurrent checks for the same namespace
//! into a single upstream round-trip.
//!
//! - Denials are cached exactly like approvals, so a namespace the caller has
//!   no rights to is not re-probed until its entry expires
//! - A TTL of zero disables caching; every call re-checks
//! - Expired entries are swept opportunistically, at most once per sweep
//!   interval, or by an optional background task
//! - At most one check per namespace is in flight. It runs in its own task, so
//!   a caller giving up cannot leave the in-flight registry stuck
//!
//! # Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use metrics_gate::auth::cache::{AuthorizationCache, CacheConfig};
//! use metrics_gate::auth::checker::MockPermissionChecker;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cache = AuthorizationCache::new(CacheConfig::default(), Arc::new(MockPermissionChecker::allowing()));
//!
//! // First call asks the control plane, second one is served from cache
//! cache.authenticate("ns-alice").await.unwrap();
//! cache.authenticate("ns-alice").await.unwrap();
//!
//! assert_eq!(cache.cache_stats().await.size, 1);
//! # }
//! ```

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::audit::{audit_authorization_decision, DecisionSource};
use super::checker::{CheckError, PermissionChecker};
use crate::error::MetricsError;
use crate::observability::metrics::{record_authorization_check, record_cache_lookup};

type CheckResult = Result<bool, CheckError>;
type InFlightCheck = Shared<BoxFuture<'static, CheckResult>>;

/// Configuration for the authorization cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a decision stays valid; zero disables caching
    pub ttl: Duration,
    /// Minimum spacing between sweeps of expired entries
    pub sweep_interval: Duration,
    /// Also sweep from a background task (see [`AuthorizationCache::spawn_sweeper`])
    pub background_sweep: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),             // 5 minutes
            sweep_interval: Duration::from_secs(60),   // 1 minute
            background_sweep: false,
        }
    }
}

/// Snapshot of the cache for monitoring and debugging
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of live entries
    pub size: usize,
    /// Live entries, sorted by namespace
    pub entries: Vec<CacheEntryStats>,
    /// Calls answered from a cached decision
    pub hits: u64,
    /// Calls that started or joined a check
    pub misses: u64,
    /// Hit rate as percentage (0.0 - 100.0)
    pub hit_rate: f64,
    /// Entries removed by sweeps
    pub expired: u64,
    /// Checks currently in flight
    pub in_flight: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryStats {
    pub namespace: String,
    pub allowed: bool,
    pub remaining_ttl_ms: u64,
}

impl CacheStats {
    /// Calculate hit rate from hits and misses
    pub fn calculate_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    allowed: bool,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(allowed: bool, ttl: Duration) -> Self {
        Self {
            allowed,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

struct CacheState {
    entries: HashMap<String, CacheEntry>,
    in_flight: HashMap<String, InFlightCheck>,
    last_sweep: Instant,
    hits: u64,
    misses: u64,
    expired: u64,
}

impl CacheState {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: HashMap::new(),
            last_sweep: Instant::now(),
            hits: 0,
            misses: 0,
            expired: 0,
        }
    }

    /// Remove expired entries, returning how many were dropped
    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let removed = before - self.entries.len();

        self.expired += removed as u64;
        self.last_sweep = now;
        removed
    }

    fn sweep_if_due(&mut self, now: Instant, interval: Duration) {
        if now.duration_since(self.last_sweep) >= interval {
            let removed = self.sweep(now);
            if removed > 0 {
                debug!(removed = removed, "Swept expired authorization entries");
            }
        }
    }
}

/// Authorization cache gating metrics queries per namespace
///
/// Cheap to clone; clones share the same entries and in-flight registry.
#[derive(Clone)]
pub struct AuthorizationCache {
    config: CacheConfig,
    checker: Arc<dyn PermissionChecker>,
    state: Arc<Mutex<CacheState>>,
}

impl AuthorizationCache {
    pub fn new(config: CacheConfig, checker: Arc<dyn PermissionChecker>) -> Self {
        Self {
            config,
            checker,
            state: Arc::new(Mutex::new(CacheState::new())),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn caching_enabled(&self) -> bool {
        !self.config.ttl.is_zero()
    }

    /// Gate a request for `namespace`
    ///
    /// Returns `Ok(())` if the namespace may be queried. A cached or fresh
    /// denial yields [`MetricsError::PermissionDenied`]; a failed check yields
    /// [`MetricsError::AuthenticationFailed`] wrapping the checker's error.
    /// Failed checks are never cached.
    pub async fn authenticate(&self, namespace: &str) -> Result<(), MetricsError> {
        let namespace = namespace.trim();
        if namespace.is_empty() {
            return Err(MetricsError::InvalidNamespace);
        }

        let (check, source) = {
            let mut state = self.state.lock().await;
            let now = Instant::now();

            if self.caching_enabled() {
                state.sweep_if_due(now, self.config.sweep_interval);

                let cached = state
                    .entries
                    .get(namespace)
                    .filter(|entry| entry.is_live(now))
                    .map(|entry| entry.allowed);

                if let Some(allowed) = cached {
                    state.hits += 1;
                    drop(state);

                    record_cache_lookup(true);
                    audit_authorization_decision(namespace, allowed, DecisionSource::Cache);
                    return decision(namespace, allowed);
                }
            }

            state.misses += 1;

            match state.in_flight.get(namespace) {
                Some(check) => {
                    debug!(namespace = %namespace, "Joining in-flight permission check");
                    (check.clone(), DecisionSource::InFlight)
                }
                None => {
                    let check = self.start_check(namespace);
                    state.in_flight.insert(namespace.to_string(), check.clone());
                    (check, DecisionSource::ControlPlane)
                }
            }
        };

        record_cache_lookup(false);

        match check.await {
            Ok(allowed) => {
                audit_authorization_decision(namespace, allowed, source);
                decision(namespace, allowed)
            }
            Err(source) => {
                warn!(namespace = %namespace, error = %source, "Permission check failed");
                Err(MetricsError::AuthenticationFailed {
                    namespace: namespace.to_string(),
                    source,
                })
            }
        }
    }

    /// Run the checker in its own task and return a joinable handle to it
    ///
    /// The task writes the cache entry and removes itself from the in-flight
    /// registry under the same lock, whatever the outcome.
    fn start_check(&self, namespace: &str) -> InFlightCheck {
        let checker = Arc::clone(&self.checker);
        let state = Arc::clone(&self.state);
        let ttl = self.config.ttl;
        let ns = namespace.to_string();

        let task = tokio::spawn(async move {
            let started = std::time::Instant::now();

            let result = match AssertUnwindSafe(checker.check_access(&ns)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(CheckError::Aborted {
                    namespace: ns.clone(),
                    reason: "permission check panicked".to_string(),
                }),
            };

            {
                let mut state = state.lock().await;
                if let Ok(allowed) = result {
                    if !ttl.is_zero() {
                        state.entries.insert(ns.clone(), CacheEntry::new(allowed, ttl));
                    }
                }
                state.in_flight.remove(&ns);
            }

            let outcome = match &result {
                Ok(true) => "allowed",
                Ok(false) => "denied",
                Err(CheckError::Connectivity { .. }) => "connectivity_error",
                Err(CheckError::Authorization { .. }) => "authorization_error",
                Err(CheckError::Aborted { .. }) => "aborted",
            };
            record_authorization_check(outcome, started.elapsed());

            result
        });

        let namespace = namespace.to_string();
        async move {
            task.await.unwrap_or_else(|e| {
                Err(CheckError::Aborted {
                    namespace,
                    reason: e.to_string(),
                })
            })
        }
        .boxed()
        .shared()
    }

    /// Drop every cached decision
    pub async fn clear_cache(&self) {
        self.state.lock().await.entries.clear();
        debug!("Authorization cache cleared");
    }

    /// Drop the cached decision for one namespace
    pub async fn clear_namespace_cache(&self, namespace: &str) {
        let namespace = namespace.trim();
        if self.state.lock().await.entries.remove(namespace).is_some() {
            debug!(namespace = %namespace, "Authorization cache entry cleared");
        }
    }

    /// Live entries with their remaining TTL, after an opportunistic sweep
    pub async fn cache_stats(&self) -> CacheStats {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if self.caching_enabled() {
            state.sweep_if_due(now, self.config.sweep_interval);
        }

        let mut entries: Vec<CacheEntryStats> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(namespace, entry)| CacheEntryStats {
                namespace: namespace.clone(),
                allowed: entry.allowed,
                remaining_ttl_ms: entry.expires_at.duration_since(now).as_millis() as u64,
            })
            .collect();
        entries.sort_by(|a, b| a.namespace.cmp(&b.namespace));

        CacheStats {
            size: entries.len(),
            entries,
            hits: state.hits,
            misses: state.misses,
            hit_rate: CacheStats::calculate_hit_rate(state.hits, state.misses),
            expired: state.expired,
            in_flight: state.in_flight.len(),
        }
    }

    /// Periodically sweep expired entries from a background task
    ///
    /// The task only holds a weak reference and stops once every clone of
    /// the cache has been dropped.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let state = Arc::downgrade(&self.state);
        let interval = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    debug!("Authorization cache dropped, stopping sweeper");
                    break;
                };

                let removed = state.lock().await.sweep(Instant::now());
                if removed > 0 {
                    debug!(removed = removed, "Background sweep removed expired entries");
                }
            }
        })
    }
}

fn decision(namespace: &str, allowed: bool) -> Result<(), MetricsError> {
    if allowed {
        Ok(())
    } else {
        Err(MetricsError::PermissionDenied {
            namespace: namespace.to_string(),
        })
    }
}
