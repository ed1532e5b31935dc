//! HTTP client for the etcd v2 keys API

use async_trait::async_trait;
use havok_core::{ConfigStore, Node, StoreError};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, warn};

use crate::wire::{error_from_body, node_from_body};

/// EtcdClient talks to a list of etcd machines.
///
/// Requests go to the first machine that accepts a connection; a machine
/// that refuses one is skipped for that request.
pub struct EtcdClient {
    http: Client,
    machines: Vec<String>,
}

impl EtcdClient {
    /// Create a client for the given machine URLs, e.g. `http://127.0.0.1:4001`
    pub fn new(machines: Vec<String>, timeout: Duration) -> Result<Self, StoreError> {
        let machines: Vec<String> = machines
            .into_iter()
            .map(|m| m.trim().trim_end_matches('/').to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if machines.is_empty() {
            return Err(StoreError::Backend("no etcd machines configured".to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Backend(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, machines })
    }

    pub fn machines(&self) -> &[String] {
        &self.machines
    }

    fn key_url(machine: &str, key: &str) -> String {
        format!("{}/v2/keys/{}", machine, key.trim_start_matches('/'))
    }

    async fn send<F>(&self, key: &str, build: F) -> Result<Response, StoreError>
    where
        F: Fn(&Client, String) -> RequestBuilder,
    {
        let mut last_error = None;
        for machine in &self.machines {
            let url = Self::key_url(machine, key);
            match build(&self.http, url).send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() => {
                    warn!(machine = %machine, error = %e, "etcd machine unreachable, trying next");
                    last_error = Some(e);
                }
                Err(e) => return Err(StoreError::Backend(format!("etcd request for {} failed: {}", key, e))),
            }
        }

        Err(StoreError::Backend(match last_error {
            Some(e) => format!("no etcd machine reachable for {}: {}", key, e),
            None => format!("no etcd machine reachable for {}", key),
        }))
    }

    async fn read_body(key: &str, response: Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Backend(format!("failed to read etcd response for {}: {}", key, e)))?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(error_from_body(key, status.as_u16(), &body))
        }
    }
}

#[async_trait]
impl ConfigStore for EtcdClient {
    async fn get(&self, key: &str) -> Result<Node, StoreError> {
        debug!("etcd get {}", key);
        let response = self
            .send(key, |http, url| http.get(url).query(&[("recursive", "true")]))
            .await?;
        let body = Self::read_body(key, response).await?;
        node_from_body(key, &body)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        debug!("etcd set {}", key);
        let response = self
            .send(key, |http, url| http.put(url).form(&[("value", value)]))
            .await?;
        Self::read_body(key, response).await.map(|_| ())
    }

    async fn create_dir(&self, key: &str) -> Result<(), StoreError> {
        debug!("etcd mkdir {}", key);
        let response = self
            .send(key, |http, url| {
                http.put(url).form(&[("dir", "true"), ("prevExist", "false")])
            })
            .await?;
        Self::read_body(key, response).await.map(|_| ())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        debug!("etcd delete {}", key);
        let response = self
            .send(key, |http, url| {
                http.delete(url)
                    .query(&[("recursive", "true"), ("dir", "true")])
            })
            .await?;
        Self::read_body(key, response).await.map(|_| ())
    }
}
