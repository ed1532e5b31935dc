//! Command-line flags

use clap::{Parser, ValueEnum};
use havok_core::{ConnLimitPolicy, EngineConfig, RateLimitPolicy};
use std::net::SocketAddr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Register docker containers as vulcand backends in etcd
#[derive(Parser, Debug, Clone)]
#[command(name = "havok", version, about)]
pub struct Args {
    /// Docker URL
    #[arg(long, env = "HAVOK_DOCKER", default_value = "unix:///var/run/docker.sock")]
    pub docker: String,

    /// Comma separated list of etcd hosts
    #[arg(
        long,
        env = "HAVOK_ETCD_MACHINES",
        default_value = "http://127.0.0.1:4001",
        value_delimiter = ','
    )]
    pub etcd_machines: Vec<String>,

    /// Root of the vulcand key space in etcd
    #[arg(long, env = "HAVOK_ETCD_PREFIX", default_value = "vulcand")]
    pub etcd_prefix: String,

    /// Timeout for a single etcd request
    #[arg(long, env = "HAVOK_ETCD_TIMEOUT_SECS", default_value_t = 5)]
    pub etcd_timeout_secs: u64,

    /// Root level domain
    #[arg(long, env = "HAVOK_ROOT_DOMAIN", default_value = "local")]
    pub root_domain: String,

    /// Subdomain also served by a container living at the root domain, e.g. www
    #[arg(long, env = "HAVOK_ROOT_SUBDOMAIN")]
    pub root_subdomain: Option<String>,

    /// Host IP for accessing containers
    #[arg(long, env = "HAVOK_HOST_IP", default_value = "127.0.0.1")]
    pub host_ip: String,

    /// Containers with a name matching this regex get added to etcd
    #[arg(long, env = "HAVOK_NAMES", default_value = ".*")]
    pub names: String,

    /// Rate limit in requests per second (0 disables)
    #[arg(long, env = "HAVOK_RATE_LIMIT", default_value_t = 0)]
    pub rate_limit: u64,

    /// Variable for rate limiting
    #[arg(long = "rate-limit-var", env = "HAVOK_RATE_LIMIT_VAR", default_value = "client.ip")]
    pub rate_limit_var: String,

    /// Rate limit burst
    #[arg(long, env = "HAVOK_RATE_LIMIT_BURST", default_value_t = 1)]
    pub rate_limit_burst: u64,

    /// Connection limit (0 disables)
    #[arg(long, env = "HAVOK_CONN_LIMIT", default_value_t = 0)]
    pub conn_limit: u64,

    /// Variable for connection limiting
    #[arg(long = "conn-limit-var", env = "HAVOK_CONN_LIMIT_VAR", default_value = "client.ip")]
    pub conn_limit_var: String,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "HAVOK_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    #[arg(long, env = "HAVOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            runtime_endpoint: self.docker.clone(),
            store_endpoints: self
                .etcd_machines
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            store_prefix: self.etcd_prefix.clone(),
            root_domain: self.root_domain.clone(),
            root_subdomain: self.root_subdomain.clone().filter(|s| !s.is_empty()),
            host_ip: self.host_ip.clone(),
            name_pattern: self.names.clone(),
            rate_limit: RateLimitPolicy {
                requests: self.rate_limit,
                burst: self.rate_limit_burst,
                variable: self.rate_limit_var.clone(),
            },
            conn_limit: ConnLimitPolicy {
                connections: self.conn_limit,
                variable: self.conn_limit_var.clone(),
            },
        }
    }
}
