//! In-memory configuration store
//!
//! Mirrors the directory semantics of the etcd v2 key space closely enough
//! to exercise the engine without a cluster, and records every operation.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{ConfigStore, Node, StoreError};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Entry {
    Dir,
    Value(String),
}

/// One call made against the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOp {
    Get(String),
    Set(String, String),
    CreateDir(String),
    Delete(String),
}

impl StoreOp {
    pub fn key(&self) -> &str {
        match self {
            StoreOp::Get(k) | StoreOp::Set(k, _) | StoreOp::CreateDir(k) | StoreOp::Delete(k) => k,
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, StoreOp::Get(_))
    }
}

/// MemoryStore keeps the key tree in a sorted map
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
    ops: Arc<RwLock<Vec<StoreOp>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

fn normalize(key: &str) -> String {
    format!("/{}", key.trim_matches('/'))
}

fn parents(key: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = key;
    while let Some(idx) = current.rfind('/') {
        if idx == 0 {
            break;
        }
        current = &current[..idx];
        out.push(current.to_string());
    }
    out.reverse();
    out
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            ops: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Make every operation on `key` fail with a backend error
    pub async fn fail_on(&self, key: &str) {
        self.failing.write().await.insert(normalize(key));
    }

    /// Undo `fail_on` for `key`
    pub async fn recover(&self, key: &str) {
        self.failing.write().await.remove(&normalize(key));
    }

    /// Value stored at `key`, if it is a leaf
    pub async fn value(&self, key: &str) -> Option<String> {
        match self.entries.read().await.get(&normalize(key)) {
            Some(Entry::Value(v)) => Some(v.clone()),
            _ => None,
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(&normalize(key))
    }

    /// All keys currently stored, directories included
    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    /// Every operation seen so far, in call order
    pub async fn operations(&self) -> Vec<StoreOp> {
        self.ops.read().await.clone()
    }

    /// Operations that changed the tree
    pub async fn mutations(&self) -> Vec<StoreOp> {
        self.ops
            .read()
            .await
            .iter()
            .filter(|op| op.is_mutation())
            .cloned()
            .collect()
    }

    pub async fn clear_operations(&self) {
        self.ops.write().await.clear();
    }

    async fn record(&self, op: StoreOp) -> Result<(), StoreError> {
        let key = op.key().to_string();
        self.ops.write().await.push(op);
        if self.failing.read().await.contains(&key) {
            return Err(StoreError::Backend(format!("injected failure on {}", key)));
        }
        Ok(())
    }

    fn make_parents(entries: &mut BTreeMap<String, Entry>, key: &str) -> Result<(), StoreError> {
        for parent in parents(key) {
            match entries.get(&parent) {
                Some(Entry::Value(_)) => {
                    return Err(StoreError::Backend(format!("not a directory: {}", parent)));
                }
                Some(Entry::Dir) => {}
                None => {
                    entries.insert(parent, Entry::Dir);
                }
            }
        }
        Ok(())
    }

    fn build_node(entries: &BTreeMap<String, Entry>, key: &str) -> Option<Node> {
        match entries.get(key)? {
            Entry::Value(v) => Some(Node {
                key: key.to_string(),
                value: Some(v.clone()),
                dir: false,
                nodes: Vec::new(),
            }),
            Entry::Dir => {
                let prefix = format!("{}/", key);
                let nodes = entries
                    .range(prefix.clone()..)
                    .take_while(|(k, _)| k.starts_with(&prefix))
                    .filter(|(k, _)| !k[prefix.len()..].contains('/'))
                    .filter_map(|(k, _)| Self::build_node(entries, k))
                    .collect();
                Some(Node {
                    key: key.to_string(),
                    value: None,
                    dir: true,
                    nodes,
                })
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Node, StoreError> {
        let key = normalize(key);
        self.record(StoreOp::Get(key.clone())).await?;

        let entries = self.entries.read().await;
        Self::build_node(&entries, &key).ok_or(StoreError::NotFound(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let key = normalize(key);
        self.record(StoreOp::Set(key.clone(), value.to_string())).await?;

        let mut entries = self.entries.write().await;
        if let Some(Entry::Dir) = entries.get(&key) {
            return Err(StoreError::Backend(format!("not a file: {}", key)));
        }
        Self::make_parents(&mut entries, &key)?;
        entries.insert(key.clone(), Entry::Value(value.to_string()));

        debug!("Set {}", key);
        Ok(())
    }

    async fn create_dir(&self, key: &str) -> Result<(), StoreError> {
        let key = normalize(key);
        self.record(StoreOp::CreateDir(key.clone())).await?;

        let mut entries = self.entries.write().await;
        if entries.contains_key(&key) {
            return Err(StoreError::Backend(format!("key already exists: {}", key)));
        }
        Self::make_parents(&mut entries, &key)?;
        entries.insert(key.clone(), Entry::Dir);

        debug!("Created directory {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = normalize(key);
        self.record(StoreOp::Delete(key.clone())).await?;

        let mut entries = self.entries.write().await;
        if entries.remove(&key).is_none() {
            return Err(StoreError::NotFound(key));
        }
        let prefix = format!("{}/", key);
        entries.retain(|k, _| !k.starts_with(&prefix));

        debug!("Deleted {}", key);
        Ok(())
    }
}
