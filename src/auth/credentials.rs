//! Caller credentials (kubeconfig) and the control-plane host whitelist
//!
//! A caller hands over a kubeconfig whose embedded server URL is not trusted
//! as-is. Only hosts listed in the whitelist are used directly; anything else
//! is rewritten to the in-cluster API server address so a crafted kubeconfig
//! cannot point permission checks at an arbitrary endpoint.
//!
//! Credentials must be inline (`token`, `client-certificate-data`,
//! `client-key-data`, `certificate-authority-data`). Anything that makes the
//! gateway run a command or read its own filesystem is refused, since those
//! would act with the gateway's identity rather than the caller's.

use http::Uri;
use kube::config::{AuthInfo, Cluster, KubeConfigOptions, Kubeconfig};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::MetricsError;

const DEFAULT_IN_CLUSTER_HOST: &str = "kubernetes.default.svc";
const DEFAULT_IN_CLUSTER_PORT: &str = "443";

/// Parsed kubeconfig supplied by a caller
#[derive(Clone, Debug)]
pub struct Credentials {
    kubeconfig: Kubeconfig,
}

impl Credentials {
    pub fn from_yaml(yaml: &str) -> Result<Self, MetricsError> {
        let kubeconfig = Kubeconfig::from_yaml(yaml)
            .map_err(|e| MetricsError::InvalidCredentials(e.to_string()))?;

        if kubeconfig.contexts.is_empty() {
            return Err(MetricsError::InvalidCredentials(
                "kubeconfig has no contexts".to_string(),
            ));
        }

        for named in &kubeconfig.auth_infos {
            if let Some(auth_info) = &named.auth_info {
                reject_host_side_auth(&named.name, auth_info)?;
            }
        }
        for named in &kubeconfig.clusters {
            if let Some(cluster) = &named.cluster {
                reject_host_side_cluster(&named.name, cluster)?;
            }
        }

        Ok(Self { kubeconfig })
    }

    fn current_context(&self) -> Option<&kube::config::Context> {
        let name = self.kubeconfig.current_context.as_deref()?;
        self.kubeconfig
            .contexts
            .iter()
            .find(|ctx| ctx.name == name)
            .and_then(|ctx| ctx.context.as_ref())
    }

    /// Namespace configured on the current context, if any
    pub fn default_namespace(&self) -> Option<String> {
        self.current_context()
            .and_then(|ctx| ctx.namespace.as_deref())
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
    }

    /// Server URL of the current context's cluster, as written in the kubeconfig
    pub fn server_url(&self) -> Option<&str> {
        let cluster_name = &self.current_context()?.cluster;
        self.kubeconfig
            .clusters
            .iter()
            .find(|cluster| &cluster.name == cluster_name)
            .and_then(|cluster| cluster.cluster.as_ref())
            .and_then(|cluster| cluster.server.as_deref())
    }

    /// Build a kube client config that only talks to trusted hosts
    pub async fn kube_config(
        &self,
        whitelist_hosts: &HashSet<String>,
        request_timeout: Duration,
    ) -> Result<kube::Config, MetricsError> {
        let mut config =
            kube::Config::from_custom_kubeconfig(self.kubeconfig.clone(), &KubeConfigOptions::default())
                .await
                .map_err(|e| MetricsError::InvalidCredentials(e.to_string()))?;

        if !is_whitelisted(&config.cluster_url, whitelist_hosts) {
            // TLS settings written for the caller's server do not apply to ours
            config.cluster_url = trusted_cluster_url(&config.cluster_url, whitelist_hosts, in_cluster_url)?;
            config.accept_invalid_certs = false;
            config.tls_server_name = None;
            config.root_cert = in_cluster_root_cert();
        }
        config.connect_timeout = Some(request_timeout);
        config.read_timeout = Some(request_timeout);
        config.write_timeout = Some(request_timeout);

        Ok(config)
    }
}

fn refused(kind: &str, name: &str, field: &str) -> MetricsError {
    MetricsError::InvalidCredentials(format!("{} {:?} uses unsupported field {}", kind, name, field))
}

/// Refuse user entries that run commands or read local files
fn reject_host_side_auth(name: &str, auth_info: &AuthInfo) -> Result<(), MetricsError> {
    let forbidden = [
        ("exec", auth_info.exec.is_some()),
        ("auth-provider", auth_info.auth_provider.is_some()),
        ("tokenFile", auth_info.token_file.is_some()),
        ("client-certificate", auth_info.client_certificate.is_some()),
        ("client-key", auth_info.client_key.is_some()),
        ("username", auth_info.username.is_some()),
        ("password", auth_info.password.is_some()),
        ("as", auth_info.impersonate.is_some()),
        ("as-groups", auth_info.impersonate_groups.is_some()),
    ];

    match forbidden.iter().find(|(_, present)| *present) {
        Some((field, _)) => Err(refused("user", name, field)),
        None => Ok(()),
    }
}

/// Refuse cluster entries that read local files or route through a proxy
fn reject_host_side_cluster(name: &str, cluster: &Cluster) -> Result<(), MetricsError> {
    if cluster.certificate_authority.is_some() {
        return Err(refused("cluster", name, "certificate-authority"));
    }
    if cluster.proxy_url.is_some() {
        return Err(refused("cluster", name, "proxy-url"));
    }
    Ok(())
}

/// CA bundle of the in-cluster API server, when running inside a cluster
fn in_cluster_root_cert() -> Option<Vec<Vec<u8>>> {
    kube::Config::incluster().ok().and_then(|config| config.root_cert)
}

/// Hosts compare case-insensitively; whitelist entries are expected lowercase
fn is_whitelisted(server: &Uri, whitelist_hosts: &HashSet<String>) -> bool {
    server
        .host()
        .is_some_and(|host| whitelist_hosts.contains(&host.to_ascii_lowercase()))
}

/// Keep `server` if its host is whitelisted, otherwise use the in-cluster URL
pub fn trusted_cluster_url<F>(
    server: &Uri,
    whitelist_hosts: &HashSet<String>,
    in_cluster: F,
) -> Result<Uri, MetricsError>
where
    F: FnOnce() -> Result<Uri, MetricsError>,
{
    match server.host() {
        Some(host) if is_whitelisted(server, whitelist_hosts) => {
            debug!(host = %host, "Control plane host is whitelisted");
            Ok(server.clone())
        }
        host => {
            let rewritten = in_cluster()?;
            warn!(
                host = ?host,
                rewritten = %rewritten,
                "Control plane host not whitelisted, using in-cluster API server"
            );
            Ok(rewritten)
        }
    }
}

/// In-cluster API server URL derived from the service environment variables
pub fn in_cluster_url() -> Result<Uri, MetricsError> {
    in_cluster_url_from(
        std::env::var("KUBERNETES_SERVICE_HOST").ok(),
        std::env::var("KUBERNETES_SERVICE_PORT").ok(),
    )
}

pub fn in_cluster_url_from(host: Option<String>, port: Option<String>) -> Result<Uri, MetricsError> {
    let host = host
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_IN_CLUSTER_HOST.to_string());
    let port = port
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_IN_CLUSTER_PORT.to_string());

    // IPv6 service hosts need brackets in the authority
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host
    };

    format!("https://{}:{}", host, port)
        .parse::<Uri>()
        .map_err(|e| MetricsError::InvalidCredentials(format!("invalid in-cluster address: {}", e)))
}
