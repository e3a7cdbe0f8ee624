pub mod monitor;
pub mod prometheus;

pub use monitor::{DatabaseService, LaunchpadService, MinioService, MonitorGate, RawService};
pub use prometheus::{HttpQueryExecutor, QueryExecutor, QueryResponse, TimeRange};
