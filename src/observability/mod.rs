//! Observability for the gateway
//!
//! - Prometheus metrics with bounded label cardinality
//! - The `/metrics` exposition route
//!
//! Structured logging lives in [`crate::logging`].

pub mod endpoint;
pub mod metrics;
pub mod recorder;

pub use endpoint::*;
pub use self::metrics::*;
pub use recorder::*;
