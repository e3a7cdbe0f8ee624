use thiserror::Error;
use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use crate::auth::checker::CheckError;

/// Errors surfaced by the metrics library
///
/// Every variant carries enough context to tell a connectivity failure from an
/// authorization failure from a plain denial at the call site. None of these
/// are retried internally.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid namespace: namespace must not be blank")]
    InvalidNamespace,

    #[error("Namespace not found: no namespace given and the credentials carry no default")]
    NamespaceNotFound,

    #[error("Permission denied for namespace {namespace}")]
    PermissionDenied { namespace: String },

    #[error("Authentication failed for namespace {namespace}: {source}")]
    AuthenticationFailed {
        namespace: String,
        #[source]
        source: CheckError,
    },

    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl MetricsError {
    /// Stable machine-readable code used in HTTP bodies and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            MetricsError::InvalidNamespace => "INVALID_NAMESPACE",
            MetricsError::NamespaceNotFound => "NAMESPACE_NOT_FOUND",
            MetricsError::PermissionDenied { .. } => "PERMISSION_DENIED",
            MetricsError::AuthenticationFailed { source, .. } => match source {
                CheckError::Connectivity { .. } => "CONNECTIVITY_ERROR",
                CheckError::Authorization { .. } => "AUTHORIZATION_ERROR",
                CheckError::Aborted { .. } => "AUTHENTICATION_FAILED",
            },
            MetricsError::UnsupportedQuery(_) => "UNSUPPORTED_QUERY",
            MetricsError::QueryExecution(_) => "QUERY_EXECUTION_ERROR",
            MetricsError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Metrics(err) => match err {
                MetricsError::InvalidNamespace
                | MetricsError::NamespaceNotFound
                | MetricsError::UnsupportedQuery(_) => StatusCode::BAD_REQUEST,
                MetricsError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
                MetricsError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
                MetricsError::AuthenticationFailed { source, .. } => match source {
                    CheckError::Connectivity { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::BAD_GATEWAY,
                },
                MetricsError::QueryExecution(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Metrics(err) => err.code(),
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't expose internal error details
        let message = match &self {
            AppError::Internal(_) | AppError::Config(_) => "Internal error".to_string(),
            _ => self.to_string(),
        };

        let body = json!({
            "error": self.code(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
