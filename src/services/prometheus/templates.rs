//! PromQL templates for the platform's monitored workloads
//!
//! Placeholders are substituted textually:
//!
//! - launchpad: `$namespace`, `$pod`, `@persistentvolumeclaim`
//! - databases: `#` is the namespace, `@` the database (cluster) name
//! - minio: `@` is the bucket, `#` the instance
//!
//! Every occurrence of a placeholder is replaced. The rendered query is
//! otherwise passed to the backend untouched, so every substituted value is
//! checked against a name charset first; a quote or brace could otherwise
//! close the label matcher and select another namespace.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::MetricsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[serde(rename = "apecloud-mysql")]
    ApecloudMysql,
    Postgresql,
    Mongodb,
    Redis,
    Kafka,
    Milvus,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 6] = [
        DatabaseType::ApecloudMysql,
        DatabaseType::Postgresql,
        DatabaseType::Mongodb,
        DatabaseType::Redis,
        DatabaseType::Kafka,
        DatabaseType::Milvus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::ApecloudMysql => "apecloud-mysql",
            DatabaseType::Postgresql => "postgresql",
            DatabaseType::Mongodb => "mongodb",
            DatabaseType::Redis => "redis",
            DatabaseType::Kafka => "kafka",
            DatabaseType::Milvus => "milvus",
        }
    }

    fn templates(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            DatabaseType::ApecloudMysql => MYSQL,
            DatabaseType::Postgresql => POSTGRESQL,
            DatabaseType::Mongodb => MONGODB,
            DatabaseType::Redis => REDIS,
            DatabaseType::Kafka => KAFKA,
            DatabaseType::Milvus => MILVUS,
        }
    }

    /// Metric names with a template for this database type
    pub fn metrics(&self) -> impl Iterator<Item = &'static str> {
        self.templates().iter().map(|(name, _)| *name)
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatabaseType::ALL
            .into_iter()
            .find(|db| db.as_str() == s)
            .ok_or_else(|| MetricsError::UnsupportedQuery(format!("database type {}", s)))
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], metric: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == metric)
        .map(|(_, template)| *template)
}

struct NamePatterns {
    /// DNS-1123 subdomain: namespaces, pods, claims, clusters, buckets
    object: Regex,
    /// Claim matcher; a name optionally wrapped in `.*`
    claim: Regex,
    /// `host` or `host:port`
    instance: Regex,
}

static NAME_PATTERNS: OnceLock<NamePatterns> = OnceLock::new();

fn name_patterns() -> &'static NamePatterns {
    NAME_PATTERNS.get_or_init(|| {
        let compile = |pattern: &str| {
            // Patterns are literals checked by the tests below
            Regex::new(pattern).unwrap_or_else(|e| panic!("invalid name pattern {pattern}: {e}"))
        };
        NamePatterns {
            object: compile(r"^[a-z0-9]([-a-z0-9.]*[a-z0-9])?$"),
            claim: compile(r"^(\.\*)?[a-z0-9]([-a-z0-9.]*[a-z0-9])?(\.\*)?$"),
            instance: compile(r"^[a-z0-9]([-a-z0-9.]*[a-z0-9])?(:[0-9]{1,5})?$"),
        }
    })
}

const MAX_NAME_LEN: usize = 253;

/// Reject a substituted value that does not match `pattern`
fn check_name(kind: &str, value: &str, pattern: &Regex) -> Result<(), MetricsError> {
    if value.len() <= MAX_NAME_LEN && pattern.is_match(value) {
        Ok(())
    } else {
        Err(MetricsError::UnsupportedQuery(format!("invalid {} name {:?}", kind, value)))
    }
}

/// Metric names with a launchpad template
pub fn launchpad_metrics() -> impl Iterator<Item = &'static str> {
    LAUNCHPAD.iter().map(|(name, _)| *name)
}

/// Metric names with a minio template
pub fn minio_metrics() -> impl Iterator<Item = &'static str> {
    MINIO.iter().map(|(name, _)| *name)
}

/// Render a compute-workload query
///
/// Without an explicit claim name the storage query matches every claim
/// whose name contains the pod name.
pub fn launchpad_query(
    metric: &str,
    namespace: &str,
    pod: &str,
    pvc: Option<&str>,
) -> Result<String, MetricsError> {
    let template = lookup(LAUNCHPAD, metric)
        .ok_or_else(|| MetricsError::UnsupportedQuery(format!("launchpad/{}", metric)))?;

    let patterns = name_patterns();
    check_name("namespace", namespace, &patterns.object)?;
    check_name("pod", pod, &patterns.object)?;

    let pvc = match pvc.map(str::trim).filter(|p| !p.is_empty()) {
        Some(pvc) => {
            check_name("volume claim", pvc, &patterns.claim)?;
            pvc.to_string()
        }
        None => format!(".*{}.*", pod),
    };

    Ok(template
        .replace("@persistentvolumeclaim", &pvc)
        .replace("$namespace", namespace)
        .replace("$pod", pod))
}

pub fn database_query(
    db_type: DatabaseType,
    metric: &str,
    namespace: &str,
    db_name: &str,
) -> Result<String, MetricsError> {
    let template = lookup(db_type.templates(), metric)
        .ok_or_else(|| MetricsError::UnsupportedQuery(format!("{}/{}", db_type, metric)))?;

    let patterns = name_patterns();
    check_name("namespace", namespace, &patterns.object)?;
    check_name("database", db_name, &patterns.object)?;

    Ok(template.replace('#', namespace).replace('@', db_name))
}

pub fn minio_query(metric: &str, bucket: &str, instance: &str) -> Result<String, MetricsError> {
    let template = lookup(MINIO, metric)
        .ok_or_else(|| MetricsError::UnsupportedQuery(format!("minio/{}", metric)))?;

    let patterns = name_patterns();
    check_name("bucket", bucket, &patterns.object)?;
    check_name("instance", instance, &patterns.instance)?;

    Ok(template.replace('@', bucket).replace('#', instance))
}

pub(crate) const LAUNCHPAD: &[(&str, &str)] = &[
    (
        "cpu",
        r##"round(sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace=~"$namespace",pod=~"$pod.*"}) by (pod) / sum(cluster:namespace:pod_cpu:active:kube_pod_container_resource_limits{namespace=~"$namespace",pod=~"$pod.*"}) by (pod) * 100,0.01)"##,
    ),
    (
        "memory",
        r##"round(sum(container_memory_working_set_bytes{job="kubelet", metrics_path="/metrics/cadvisor",namespace=~"$namespace",pod=~"$pod.*"}) by(pod) / sum(cluster:namespace:pod_memory:active:kube_pod_container_resource_limits{namespace=~"$namespace",pod=~"$pod.*"}) by (pod)* 100, 0.01)"##,
    ),
    (
        "average_cpu",
        r##"avg(round(sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace=~"$namespace",pod=~"$pod.*"}) by (pod) / sum(cluster:namespace:pod_cpu:active:kube_pod_container_resource_limits{namespace=~"$namespace",pod=~"$pod.*"}) by (pod) * 100,0.01))"##,
    ),
    (
        "average_memory",
        r##"avg(round(sum(container_memory_working_set_bytes{job="kubelet", metrics_path="/metrics/cadvisor",namespace=~"$namespace",pod=~"$pod.*",container!=""}) by(pod) / sum(cluster:namespace:pod_memory:active:kube_pod_container_resource_limits{namespace=~"$namespace",pod=~"$pod.*"}) by (pod) * 100, 0.01))"##,
    ),
    (
        "storage",
        r##"round((max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"$namespace", persistentvolumeclaim=~"@persistentvolumeclaim"})) / (max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"$namespace", persistentvolumeclaim=~"@persistentvolumeclaim"})) * 100, 0.01)"##,
    ),
];

pub(crate) const MYSQL: &[(&str, &str)] = &[
    (
        "cpu",
        r##"round(sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace=~"#",pod=~"@-mysql-\\d"}) by (pod) / sum(cluster:namespace:pod_cpu:active:kube_pod_container_resource_limits{namespace=~"#",pod=~"@-mysql-\\d"}) by (pod)*100,0.01)"##,
    ),
    (
        "memory",
        r##"round(sum(container_memory_working_set_bytes{job="kubelet", metrics_path="/metrics/cadvisor",namespace=~"#",container!="", image!="",pod=~"@-mysql-\\d"}) by(pod) / sum(cluster:namespace:pod_memory:active:kube_pod_container_resource_limits{namespace=~"#", pod=~"@-mysql-\\d"}) by (pod) * 100, 0.01)"##,
    ),
    (
        "disk_capacity",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-mysql-\\d"}))"##,
    ),
    (
        "disk_used",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-mysql-\\d"}))"##,
    ),
    (
        "disk",
        r##"round((max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-mysql-\\d"})) / (max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-mysql-\\d"})) * 100, 0.01)"##,
    ),
    (
        "uptime",
        r##"sum(mysql_global_status_uptime{namespace=~"#", app_kubernetes_io_instance=~"@"}) by (namespace,app_kubernetes_io_instance,pod)"##,
    ),
    (
        "connections",
        r##"sum(max_over_time(mysql_global_status_threads_connected{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])) by (namespace,app_kubernetes_io_instance,pod)"##,
    ),
    (
        "commands",
        r##"topk(5, rate(mysql_global_status_commands_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m]) > 0)"##,
    ),
    (
        "innodb",
        r##"sum(mysql_global_variables_innodb_buffer_pool_size{namespace=~"#", app_kubernetes_io_instance=~"@"}) by (namespace,app_kubernetes_io_instance,pod)"##,
    ),
    (
        "slow_queries",
        r##"sum(rate(mysql_global_status_slow_queries{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])) by (namespace,app_kubernetes_io_instance,pod)"##,
    ),
    (
        "aborted_connections",
        r##"sum(rate(mysql_global_status_aborted_connects{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])) by (namespace,app_kubernetes_io_instance,pod)"##,
    ),
    (
        "table_locks",
        r##"sum(rate(mysql_global_status_table_locks_immediate{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])) by (namespace,app_kubernetes_io_instance,pod)"##,
    ),
];

pub(crate) const POSTGRESQL: &[(&str, &str)] = &[
    (
        "cpu",
        r##"round(sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace=~"#",pod=~"@-postgresql-\\d"}) by (pod) / sum(cluster:namespace:pod_cpu:active:kube_pod_container_resource_limits{namespace=~"#",pod=~"@-postgresql-\\d"}) by (pod)*100,0.01)"##,
    ),
    (
        "memory",
        r##"round(sum(container_memory_working_set_bytes{job="kubelet", metrics_path="/metrics/cadvisor",namespace=~"#",container!="", image!="",pod=~"@-postgresql-\\d"}) by(pod) / sum(cluster:namespace:pod_memory:active:kube_pod_container_resource_limits{namespace=~"#", pod=~"@-postgresql-\\d"}) by (pod) * 100, 0.01)"##,
    ),
    (
        "disk",
        r##"round((max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-postgresql-\\d"})) / (max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-postgresql-\\d"})) * 100, 0.01)"##,
    ),
    (
        "disk_capacity",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-postgresql-\\d"}))"##,
    ),
    (
        "disk_used",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-postgresql-\\d"}))"##,
    ),
    (
        "uptime",
        r##"avg (time() - pg_postmaster_start_time_seconds{namespace=~"#", app_kubernetes_io_instance=~"@"}) by(namespace, app_kubernetes_io_instance, pod)"##,
    ),
    (
        "connections",
        r##"sum(pg_stat_database_numbackends{namespace=~"#", app_kubernetes_io_instance=~"@"})"##,
    ),
    (
        "commands",
        r##"sum by (command,app_kubernetes_io_instance)(label_replace(rate(pg_stat_database_tup_deleted{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m]),"command","delete","namespace","(.*)")) or sum by (command,app_kubernetes_io_instance)(label_replace(rate(pg_stat_database_tup_inserted{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m]),"command","insert","namespace","(.*)")) or sum by (command,app_kubernetes_io_instance)(label_replace(rate(pg_stat_database_tup_fetched{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m]),"command","fetch","namespace","(.*)")) or sum by (command,app_kubernetes_io_instance)(label_replace(rate(pg_stat_database_tup_returned{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m]),"command","return","namespace","(.*)")) or sum by (command,app_kubernetes_io_instance)(label_replace(rate(pg_stat_database_tup_updated{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m]),"command","update","namespace","(.*)"))"##,
    ),
    (
        "db_size",
        r##"pg_database_size_bytes{namespace=~"#", app_kubernetes_io_instance=~"@"}"##,
    ),
    (
        "active_connections",
        r##"pg_stat_activity_count{namespace=~"#", app_kubernetes_io_instance=~"@",state="active"}"##,
    ),
    (
        "rollbacks",
        r##"rate (pg_stat_database_xact_rollback_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])"##,
    ),
    (
        "commits",
        r##"rate (pg_stat_database_xact_commit_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])"##,
    ),
    (
        "tx_duration",
        r##"max without(state) (max_over_time(pg_stat_activity_max_tx_duration{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m]))"##,
    ),
    (
        "block_read_time",
        r##"rate(pg_stat_database_blk_read_time_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])"##,
    ),
    (
        "block_write_time",
        r##"rate(pg_stat_database_blk_write_time_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])"##,
    ),
];

pub(crate) const MONGODB: &[(&str, &str)] = &[
    (
        "cpu",
        r##"round(sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace=~"#",pod=~"@-mongodb-\\d"}) by (pod) / sum(cluster:namespace:pod_cpu:active:kube_pod_container_resource_limits{namespace=~"#",pod=~"@-mongodb-\\d"}) by (pod)*100,0.01)"##,
    ),
    (
        "memory",
        r##"round(sum(container_memory_working_set_bytes{job="kubelet", metrics_path="/metrics/cadvisor",namespace=~"#",container!="", image!="",pod=~"@-mongodb-\\d"}) by(pod) / sum(cluster:namespace:pod_memory:active:kube_pod_container_resource_limits{namespace=~"#", pod=~"@-mongodb-\\d"}) by (pod) * 100, 0.01)"##,
    ),
    (
        "disk_capacity",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-mongodb-\\d"}))"##,
    ),
    (
        "disk",
        r##"round((max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-mongodb-\\d"})) / (max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-mongodb-\\d"})) * 100, 0.01)"##,
    ),
    (
        "disk_used",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-mongodb-\\d"}))"##,
    ),
    (
        "uptime",
        r##"sum by(namespace, app_kubernetes_io_instance, pod) (mongodb_instance_uptime_seconds{namespace=~"#", app_kubernetes_io_instance=~"@"})"##,
    ),
    (
        "connections",
        r##"mongodb_connections{namespace=~"#", app_kubernetes_io_instance=~"@", state=~"current"}"##,
    ),
    (
        "commands",
        r##"label_replace(rate(mongodb_op_counters_total{namespace=~"#", app_kubernetes_io_instance=~"@", type!="command"}[1m])  or irate(mongodb_op_counters_total{namespace=~"#", app_kubernetes_io_instance=~"@", type!="command"}[1m]), "command", "$1", "type", "(.*)")"##,
    ),
    (
        "db_size",
        r##"mongodb_dbstats_dataSize{namespace=~"#", app_kubernetes_io_instance=~"@"}"##,
    ),
    (
        "document_ops",
        r##"rate(mongodb_mongod_metrics_document_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])"##,
    ),
    (
        "pg_faults",
        r##"rate(mongodb_extra_info_page_faults_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m]) or irate(mongodb_extra_info_page_faults_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])"##,
    ),
];

pub(crate) const REDIS: &[(&str, &str)] = &[
    (
        "cpu",
        r##"round(sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace=~"#",pod=~"@-redis-\\d"}) by (pod) / sum(cluster:namespace:pod_cpu:active:kube_pod_container_resource_limits{namespace=~"#",pod=~"@-redis-\\d"}) by (pod)*100,0.01)"##,
    ),
    (
        "memory",
        r##"round(sum(container_memory_working_set_bytes{job="kubelet", metrics_path="/metrics/cadvisor",namespace=~"#",container!="", image!="",pod=~"@-redis-\\d"}) by(pod) / sum(cluster:namespace:pod_memory:active:kube_pod_container_resource_limits{namespace=~"#", pod=~"@-redis-\\d"}) by (pod) * 100, 0.01)"##,
    ),
    (
        "disk_capacity",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-redis-\\d"}))"##,
    ),
    (
        "disk",
        r##"round((max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-redis-\\d"})) / (max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-redis-\\d"})) * 100, 0.01)"##,
    ),
    (
        "disk_used",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-redis-\\d"}))"##,
    ),
    (
        "uptime",
        r##"redis_uptime_in_seconds{namespace=~"#", app_kubernetes_io_instance=~"@"}"##,
    ),
    (
        "connections",
        r##"sum(redis_connected_clients{namespace=~"#", app_kubernetes_io_instance=~"@"})"##,
    ),
    (
        "commands",
        r##"label_replace(sum(irate(redis_commands_total{namespace=~"#", app_kubernetes_io_instance=~"@"} [1m])) by (cmd, namespace, app_kubernetes_io_instance), "command", "$1", "cmd", "(.*)")"##,
    ),
    (
        "db_items",
        r##"sum (redis_db_keys{namespace=~"#", app_kubernetes_io_instance=~"@"}) by (db)"##,
    ),
    (
        "hits_ratio",
        r##"avg(rate(redis_keyspace_hits_total{namespace=~"#",app_kubernetes_io_instance="@"}[1m]) / clamp_min((irate(redis_keyspace_misses_total{namespace=~"#",app_kubernetes_io_instance=~"@"}[1m]) + irate(redis_keyspace_hits_total{namespace=~"#",app_kubernetes_io_instance="@"}[1m])), 0.01)) by (pod, app_kubernetes_io_instance)"##,
    ),
    (
        "commands_duration",
        r##"avg(rate(redis_commands_duration_seconds_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])) by (cmd) / avg(irate(redis_commands_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])) by (cmd)"##,
    ),
    (
        "blocked_connections",
        r##"sum(redis_blocked_clients{namespace=~"#", app_kubernetes_io_instance=~"@"})"##,
    ),
    (
        "key_evictions",
        r##"irate(redis_evicted_keys_total{namespace=~"#", app_kubernetes_io_instance=~"@"}[1m])"##,
    ),
];

pub(crate) const KAFKA: &[(&str, &str)] = &[
    (
        "cpu",
        r##"round(sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace=~"#",pod=~"@-kafka-.*"}) by (pod) / sum(cluster:namespace:pod_cpu:active:kube_pod_container_resource_limits{namespace=~"#",pod=~"@-kafka-.*"}) by (pod)*100,0.01)"##,
    ),
    (
        "memory",
        r##"round(sum(container_memory_working_set_bytes{job="kubelet", metrics_path="/metrics/cadvisor",namespace=~"#",container!="", image!="",pod=~"@-kafka-.*"}) by(pod) / sum(cluster:namespace:pod_memory:active:kube_pod_container_resource_limits{namespace=~"#", pod=~"@-kafka-.*"}) by (pod) * 100, 0.01)"##,
    ),
    (
        "disk_capacity",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-(kafka-broker|kafka-server)-\\d"}))"##,
    ),
    (
        "disk",
        r##"round((max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-(kafka-broker|kafka-server)-\\d"})) / (max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_capacity_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-(kafka-broker|kafka-server)-\\d"})) * 100, 0.01)"##,
    ),
    (
        "disk_used",
        r##"(max by (persistentvolumeclaim,namespace) (kubelet_volume_stats_used_bytes {namespace=~"#", persistentvolumeclaim=~"data-@-(kafka-broker|kafka-server)-\\d"}))"##,
    ),
];

pub(crate) const MILVUS: &[(&str, &str)] = &[
    (
        "cpu",
        r##"round(sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace=~"#",pod=~"@-milvus-.*"}) by (pod) / sum(cluster:namespace:pod_cpu:active:kube_pod_container_resource_limits{namespace=~"#",pod=~"@-milvus-.*"}) by (pod)*100,0.01)"##,
    ),
    (
        "memory",
        r##"round(sum(container_memory_working_set_bytes{job="kubelet", metrics_path="/metrics/cadvisor",namespace=~"#",container!="", image!="",pod=~"@-milvus-.*"}) by(pod) / sum(cluster:namespace:pod_memory:active:kube_pod_container_resource_limits{namespace=~"#", pod=~"@-milvus-.*"}) by (pod) * 100, 0.01)"##,
    ),
];

pub(crate) const MINIO: &[(&str, &str)] = &[
    (
        "minio_bucket_usage_object_total",
        r##"minio_bucket_usage_object_total{bucket="@", instance="#"}"##,
    ),
    (
        "minio_bucket_usage_total_bytes",
        r##"minio_bucket_usage_total_bytes{bucket="@", instance="#"}"##,
    ),
    (
        "minio_bucket_traffic_received_bytes",
        r##"sum(minio_bucket_traffic_received_bytes{bucket="@", instance="#"}) by (bucket, instance, job, namespace)"##,
    ),
    (
        "minio_bucket_traffic_sent_bytes",
        r##"sum(minio_bucket_traffic_sent_bytes{bucket="@", instance="#"}) by (bucket, instance, job, namespace)"##,
    ),
];
