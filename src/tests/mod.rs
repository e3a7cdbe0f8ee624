//! Cross-module tests
//!
//! Drive a [`crate::client::MetricsClient`] assembled from mock parts through
//! every façade service and check how they share one authorization cache.

pub mod client_flow;
