//! JSON bodies of the etcd v2 keys API

use havok_core::{Node, StoreError};
use serde::Deserialize;

/// etcd error code for a missing key
pub const KEY_NOT_FOUND: u64 = 100;

/// Successful response to a keys request
#[derive(Debug, Deserialize)]
pub struct KeysResponse {
    pub action: String,
    pub node: Option<EtcdNode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EtcdNode {
    #[serde(default)]
    pub key: String,
    pub value: Option<String>,
    #[serde(default)]
    pub dir: bool,
    #[serde(default)]
    pub nodes: Vec<EtcdNode>,
}

impl From<EtcdNode> for Node {
    fn from(node: EtcdNode) -> Self {
        Node {
            key: node.key,
            value: node.value,
            dir: node.dir,
            nodes: node.nodes.into_iter().map(Node::from).collect(),
        }
    }
}

/// Error body returned with non-2xx responses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtcdErrorBody {
    pub error_code: u64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub cause: String,
}

/// Map a failed response to a store error
pub fn error_from_body(key: &str, status: u16, body: &str) -> StoreError {
    match serde_json::from_str::<EtcdErrorBody>(body) {
        Ok(err) if err.error_code == KEY_NOT_FOUND => StoreError::NotFound(key.to_string()),
        Ok(err) => StoreError::Backend(format!(
            "etcd error {} on {}: {} ({})",
            err.error_code, key, err.message, err.cause
        )),
        Err(_) => StoreError::Backend(format!("etcd returned HTTP {} for {}", status, key)),
    }
}

/// Decode a successful response into a node
pub fn node_from_body(key: &str, body: &str) -> Result<Node, StoreError> {
    let response: KeysResponse = serde_json::from_str(body)
        .map_err(|e| StoreError::Backend(format!("invalid etcd response for {}: {}", key, e)))?;
    response
        .node
        .map(Node::from)
        .ok_or_else(|| StoreError::Backend(format!("etcd response for {} has no node", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found() {
        let body = r#"{"errorCode":100,"message":"Key not found","cause":"/vulcand/hosts/a","index":12}"#;
        assert_eq!(
            error_from_body("/vulcand/hosts/a", 404, body),
            StoreError::NotFound("/vulcand/hosts/a".to_string())
        );
    }

    #[test]
    fn test_other_error_codes_are_backend_errors() {
        let body = r#"{"errorCode":105,"message":"Key already exists","cause":"/vulcand/hosts/a","index":12}"#;
        match error_from_body("/vulcand/hosts/a", 412, body) {
            StoreError::Backend(msg) => {
                assert!(msg.contains("105"));
                assert!(msg.contains("Key already exists"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_json_error() {
        match error_from_body("/k", 502, "<html>bad gateway</html>") {
            StoreError::Backend(msg) => assert!(msg.contains("502")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_directory_listing() {
        let body = r#"{
            "action": "get",
            "node": {
                "key": "/vulcand/upstreams/up-a/endpoints",
                "dir": true,
                "nodes": [
                    {"key": "/vulcand/upstreams/up-a/endpoints/web1", "value": "http://10.0.0.5:8080", "modifiedIndex": 7, "createdIndex": 7},
                    {"key": "/vulcand/upstreams/up-a/endpoints/web2", "value": "http://10.0.0.5:8081", "modifiedIndex": 8, "createdIndex": 8}
                ],
                "modifiedIndex": 6,
                "createdIndex": 6
            }
        }"#;
        let node = node_from_body("/vulcand/upstreams/up-a/endpoints", body).unwrap();
        assert!(node.dir);
        assert_eq!(node.nodes.len(), 2);
        assert_eq!(node.nodes[1].name(), "web2");
        assert_eq!(node.nodes[1].value.as_deref(), Some("http://10.0.0.5:8081"));
    }

    #[test]
    fn test_empty_directory_has_no_nodes_field() {
        let body = r#"{"action":"get","node":{"key":"/vulcand/upstreams/up-a/endpoints","dir":true,"modifiedIndex":6,"createdIndex":6}}"#;
        let node = node_from_body("/vulcand/upstreams/up-a/endpoints", body).unwrap();
        assert!(node.dir);
        assert!(node.nodes.is_empty());
    }
}
