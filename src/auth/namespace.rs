use crate::error::MetricsError;

/// Picks the namespace a request runs against
///
/// An explicit namespace always wins; otherwise the default namespace from the
/// caller's current kubeconfig context is used.
#[derive(Debug, Clone, Default)]
pub struct NamespaceResolver {
    default_namespace: Option<String>,
}

impl NamespaceResolver {
    pub fn new(default_namespace: Option<String>) -> Self {
        let default_namespace = default_namespace
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty());
        Self { default_namespace }
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    pub fn resolve(&self, explicit: Option<&str>) -> Result<String, MetricsError> {
        if let Some(ns) = explicit.map(str::trim).filter(|ns| !ns.is_empty()) {
            return Ok(ns.to_string());
        }

        self.default_namespace
            .clone()
            .ok_or(MetricsError::NamespaceNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_namespace_wins() {
        let resolver = NamespaceResolver::new(Some("ns-default".to_string()));
        assert_eq!(resolver.resolve(Some("  ns-explicit ")).unwrap(), "ns-explicit");
    }

    #[test]
    fn test_falls_back_to_context_default() {
        let resolver = NamespaceResolver::new(Some("ns-default".to_string()));
        assert_eq!(resolver.resolve(None).unwrap(), "ns-default");
        assert_eq!(resolver.resolve(Some("   ")).unwrap(), "ns-default");
    }

    #[test]
    fn test_no_namespace_available() {
        let resolver = NamespaceResolver::new(None);
        assert!(matches!(resolver.resolve(None), Err(MetricsError::NamespaceNotFound)));
        assert!(matches!(resolver.resolve(Some("")), Err(MetricsError::NamespaceNotFound)));
    }

    #[test]
    fn test_blank_default_is_ignored() {
        let resolver = NamespaceResolver::new(Some("  ".to_string()));
        assert_eq!(resolver.default_namespace(), None);
        assert!(resolver.resolve(None).is_err());
    }
}
