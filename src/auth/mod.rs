use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

use crate::error::AppError;

pub mod audit;
pub mod cache;
pub mod checker;
pub mod credentials;
pub mod namespace;

pub use audit::*;
pub use cache::*;
pub use checker::*;
pub use credentials::*;
pub use namespace::*;

/// Per-request caller information taken from HTTP headers
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub trace_id: String,
    /// Base64-encoded kubeconfig as sent by the caller
    pub encoded_kubeconfig: Option<String>,
}

impl CallerContext {
    pub fn is_authenticated(&self) -> bool {
        self.encoded_kubeconfig.is_some()
    }

    /// Decoded kubeconfig YAML, or `Unauthorized` if absent or undecodable
    pub fn require_kubeconfig(&self) -> Result<String, AppError> {
        let encoded = self
            .encoded_kubeconfig
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("Authorization header with kubeconfig required".to_string()))?;

        let bytes = STANDARD
            .decode(encoded)
            .map_err(|_| AppError::Unauthorized("kubeconfig is not valid base64".to_string()))?;

        String::from_utf8(bytes).map_err(|_| AppError::Unauthorized("kubeconfig is not valid UTF-8".to_string()))
    }
}

/// Extract the caller context from request headers
pub fn extract_caller_context(headers: &HeaderMap) -> CallerContext {
    let trace_id = headers
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let encoded_kubeconfig = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s).trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    CallerContext {
        trace_id,
        encoded_kubeconfig,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_caller_context_with_headers() {
        let encoded = STANDARD.encode("apiVersion: v1");
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", HeaderValue::from_static("trace123"));
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", encoded)).unwrap(),
        );

        let caller = extract_caller_context(&headers);

        assert_eq!(caller.trace_id, "trace123");
        assert!(caller.is_authenticated());
        assert_eq!(caller.require_kubeconfig().unwrap(), "apiVersion: v1");
    }

    #[test]
    fn test_bearer_prefix_is_optional() {
        let encoded = STANDARD.encode("kind: Config");
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(&encoded).unwrap());

        let caller = extract_caller_context(&headers);
        assert_eq!(caller.require_kubeconfig().unwrap(), "kind: Config");
    }

    #[test]
    fn test_extract_caller_context_minimal_headers() {
        let caller = extract_caller_context(&HeaderMap::new());

        assert!(!caller.trace_id.is_empty());
        assert!(!caller.is_authenticated());
        assert!(matches!(caller.require_kubeconfig(), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_undecodable_kubeconfig_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer not base64!!"));

        let caller = extract_caller_context(&headers);
        assert!(matches!(caller.require_kubeconfig(), Err(AppError::Unauthorized(_))));
    }
}
