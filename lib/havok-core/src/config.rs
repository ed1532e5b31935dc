//! Engine configuration

use havok_api::{ConnectionLimit, RateLimit, DEFAULT_PREFIX};
use std::net::IpAddr;

use crate::{Result, SyncError};

/// Rate-limit policy applied to every location; `requests == 0` disables it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub requests: u64,
    pub burst: u64,
    pub variable: String,
}

impl RateLimitPolicy {
    pub fn enabled(&self) -> bool {
        self.requests > 0
    }

    pub fn middleware(&self) -> RateLimit {
        RateLimit::new(self.requests, self.burst, self.variable.clone())
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            requests: 0,
            burst: 1,
            variable: "client.ip".to_string(),
        }
    }
}

/// Connection-limit policy; `connections == 0` disables it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnLimitPolicy {
    pub connections: u64,
    pub variable: String,
}

impl ConnLimitPolicy {
    pub fn enabled(&self) -> bool {
        self.connections > 0
    }

    pub fn middleware(&self) -> ConnectionLimit {
        ConnectionLimit::new(self.connections, self.variable.clone())
    }
}

impl Default for ConnLimitPolicy {
    fn default() -> Self {
        Self {
            connections: 0,
            variable: "client.ip".to_string(),
        }
    }
}

/// Everything the engine needs to know about its deployment.
///
/// Built once at startup and never changed afterwards.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Container runtime endpoint, used for logging only
    pub runtime_endpoint: String,
    /// Store endpoints, used for logging only
    pub store_endpoints: Vec<String>,
    /// Root segment of the key space
    pub store_prefix: String,
    pub root_domain: String,
    /// Alias served next to the apex, e.g. `www`
    pub root_subdomain: Option<String>,
    /// Address written into endpoint URLs
    pub host_ip: String,
    pub name_pattern: String,
    pub rate_limit: RateLimitPolicy,
    pub conn_limit: ConnLimitPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            runtime_endpoint: "unix:///var/run/docker.sock".to_string(),
            store_endpoints: vec!["http://127.0.0.1:4001".to_string()],
            store_prefix: DEFAULT_PREFIX.to_string(),
            root_domain: "local".to_string(),
            root_subdomain: None,
            host_ip: "127.0.0.1".to_string(),
            name_pattern: ".*".to_string(),
            rate_limit: RateLimitPolicy::default(),
            conn_limit: ConnLimitPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run with.
    ///
    /// The name pattern is not checked here: a bad pattern makes the
    /// filter match nothing instead of stopping the process.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.root_domain.trim().is_empty() {
            problems.push("root domain must not be empty".to_string());
        }
        if self.host_ip.parse::<IpAddr>().is_err() {
            problems.push(format!("host ip {:?} is not an IP address", self.host_ip));
        }
        if self.store_endpoints.iter().all(|e| e.trim().is_empty()) {
            problems.push("at least one store endpoint is required".to_string());
        }
        if self.store_prefix.trim_matches('/').is_empty() {
            problems.push("store prefix must not be empty".to_string());
        }
        if self.rate_limit.enabled() && self.rate_limit.variable.is_empty() {
            problems.push("rate limit variable must be set when rate limiting".to_string());
        }
        if self.conn_limit.enabled() && self.conn_limit.variable.is_empty() {
            problems.push("connection limit variable must be set when limiting connections".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Config(problems.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store_prefix, "vulcand");
        assert!(!config.rate_limit.enabled());
        assert!(!config.conn_limit.enabled());
    }

    #[test]
    fn test_rejects_bad_host_ip() {
        let config = EngineConfig {
            host_ip: "not-an-ip".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not-an-ip"));
    }

    #[test]
    fn test_collects_every_problem() {
        let config = EngineConfig {
            root_domain: String::new(),
            store_endpoints: vec![],
            ..Default::default()
        };
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("root domain"));
        assert!(msg.contains("store endpoint"));
    }

    #[test]
    fn test_enabled_limit_needs_variable() {
        let config = EngineConfig {
            rate_limit: RateLimitPolicy {
                requests: 10,
                burst: 1,
                variable: String::new(),
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_name_pattern_is_not_a_config_error() {
        let config = EngineConfig {
            name_pattern: "(".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_middleware() {
        let policy = RateLimitPolicy {
            requests: 7,
            burst: 2,
            variable: "client.ip".to_string(),
        };
        let mw = policy.middleware();
        assert_eq!(mw.middleware.requests, 7);
        assert_eq!(mw.middleware.burst, 2);

        let conn = ConnLimitPolicy {
            connections: 3,
            variable: "client.ip".to_string(),
        };
        assert_eq!(conn.middleware().middleware.connections, 3);
    }
}
