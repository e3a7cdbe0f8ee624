use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Where an authorization decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionSource {
    Cache,
    /// Joined a check another caller had already started
    InFlight,
    ControlPlane,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionSource::Cache => "cache",
            DecisionSource::InFlight => "in-flight",
            DecisionSource::ControlPlane => "control-plane",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub namespace: String,
    pub allowed: bool,
    pub source: DecisionSource,
}

impl AuditEntry {
    pub fn new(namespace: &str, allowed: bool, source: DecisionSource) -> Self {
        Self {
            timestamp: Utc::now(),
            namespace: namespace.to_string(),
            allowed,
            source,
        }
    }
}

pub fn audit_authorization_decision(namespace: &str, allowed: bool, source: DecisionSource) {
    let entry = AuditEntry::new(namespace, allowed, source);

    // Log as structured JSON
    info!(
        target: "audit",
        audit_type = "authorization",
        timestamp = %entry.timestamp.to_rfc3339(),
        namespace = %entry.namespace,
        allowed = %entry.allowed,
        source = %entry.source,
        "Authorization decision"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_decision_source_labels() {
        assert_eq!(DecisionSource::Cache.to_string(), "cache");
        assert_eq!(DecisionSource::InFlight.to_string(), "in-flight");
        assert_eq!(DecisionSource::ControlPlane.to_string(), "control-plane");

        let json = serde_json::to_value(AuditEntry::new("ns-a", true, DecisionSource::ControlPlane)).unwrap();
        assert_eq!(json["source"], "control-plane");
        assert_eq!(json["namespace"], "ns-a");
    }

    #[traced_test]
    #[test]
    fn test_audit_authorization_decision() {
        audit_authorization_decision("ns-alice", false, DecisionSource::Cache);

        assert!(logs_contain("Authorization decision"));
        assert!(logs_contain("ns-alice"));
        assert!(logs_contain("source=cache"));
    }
}
