//! Store key layout for hosts, locations and upstreams

use crate::DEFAULT_PREFIX;

/// Identifier of the single catch-all location written under every host
pub const LOCATION_ID: &str = "home";

/// Path pattern of the catch-all location
pub const CATCH_ALL_PATH: &str = "/.*";

/// Builds store paths under a fixed root.
///
/// Every method is a pure function of its arguments, so the same host and
/// backend name always map to the same keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySchema {
    root: String,
}

impl KeySchema {
    /// Create a schema rooted at `/<root>`
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            root: root.trim_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// `/<root>/hosts/<host>`
    pub fn host_key(&self, host: &str) -> String {
        format!("/{}/hosts/{}", self.root, host)
    }

    /// Upstream identifier for a host, `up-<host>`
    pub fn upstream_id(host: &str) -> String {
        format!("up-{}", host)
    }

    /// `/<root>/upstreams/up-<host>`
    pub fn upstream_key(&self, host: &str) -> String {
        format!("/{}/upstreams/{}", self.root, Self::upstream_id(host))
    }

    /// Directory holding every endpoint of the host's upstream
    pub fn endpoints_key(&self, host: &str) -> String {
        format!("{}/endpoints", self.upstream_key(host))
    }

    /// Endpoint contributed by the backend `name`
    pub fn endpoint_key(&self, name: &str, host: &str) -> String {
        format!("{}/{}", self.endpoints_key(host), name)
    }

    fn location_key(&self, host: &str) -> String {
        format!("{}/locations/{}", self.host_key(host), LOCATION_ID)
    }

    pub fn location_path_key(&self, host: &str) -> String {
        format!("{}/path", self.location_key(host))
    }

    pub fn location_upstream_key(&self, host: &str) -> String {
        format!("{}/upstream", self.location_key(host))
    }

    pub fn rate_limit_key(&self, host: &str) -> String {
        format!("{}/middlewares/ratelimit/default", self.location_key(host))
    }

    pub fn conn_limit_key(&self, host: &str) -> String {
        format!("{}/middlewares/connlimit/default", self.location_key(host))
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_upstream_keys() {
        let keys = KeySchema::default();
        assert_eq!(keys.host_key("web1.local"), "/vulcand/hosts/web1.local");
        assert_eq!(KeySchema::upstream_id("web1.local"), "up-web1.local");
        assert_eq!(keys.upstream_key("web1.local"), "/vulcand/upstreams/up-web1.local");
    }

    #[test]
    fn test_endpoint_key() {
        let keys = KeySchema::default();
        assert_eq!(
            keys.endpoint_key("web1", "web1.local"),
            "/vulcand/upstreams/up-web1.local/endpoints/web1"
        );
        assert_eq!(
            keys.endpoints_key("web1.local"),
            "/vulcand/upstreams/up-web1.local/endpoints"
        );
    }

    #[test]
    fn test_location_keys() {
        let keys = KeySchema::default();
        assert_eq!(
            keys.location_path_key("app.example.com"),
            "/vulcand/hosts/app.example.com/locations/home/path"
        );
        assert_eq!(
            keys.location_upstream_key("app.example.com"),
            "/vulcand/hosts/app.example.com/locations/home/upstream"
        );
        assert_eq!(
            keys.rate_limit_key("app.example.com"),
            "/vulcand/hosts/app.example.com/locations/home/middlewares/ratelimit/default"
        );
        assert_eq!(
            keys.conn_limit_key("app.example.com"),
            "/vulcand/hosts/app.example.com/locations/home/middlewares/connlimit/default"
        );
    }

    #[test]
    fn test_custom_root_is_normalized() {
        let keys = KeySchema::new("/proxy/");
        assert_eq!(keys.root(), "proxy");
        assert_eq!(keys.host_key("a.b"), "/proxy/hosts/a.b");
    }

    #[test]
    fn test_keys_are_deterministic() {
        let a = KeySchema::default();
        let b = KeySchema::default();
        assert_eq!(a.endpoint_key("x", "h"), b.endpoint_key("x", "h"));
        assert_eq!(a, b);
    }
}
