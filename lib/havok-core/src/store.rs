//! Hierarchical key-value store abstraction

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// A key and, for directories, its children
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    pub key: String,
    pub value: Option<String>,
    pub dir: bool,
    pub nodes: Vec<Node>,
}

impl Node {
    /// Last path segment of the key
    pub fn name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Operations the sync engine needs from the configuration store.
///
/// Reads distinguish a missing key (`StoreError::NotFound`) from every other
/// failure so callers can treat absence as meaningful.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a key; directories are returned with their children
    async fn get(&self, key: &str) -> Result<Node, StoreError>;

    /// Write a value, creating parent directories as needed
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Create an empty directory
    async fn create_dir(&self, key: &str) -> Result<(), StoreError>;

    /// Delete a key or a whole directory tree
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_name() {
        let node = Node {
            key: "/vulcand/upstreams/up-a/endpoints/web1".to_string(),
            ..Default::default()
        };
        assert_eq!(node.name(), "web1");
    }

    #[test]
    fn test_not_found() {
        assert!(StoreError::NotFound("/x".into()).is_not_found());
        assert!(!StoreError::Backend("boom".into()).is_not_found());
    }
}
