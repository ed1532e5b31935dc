//! Sync engine: turns container lifecycle events into vulcand key-space mutations
//!
//! The engine keeps no state between events. Each event is inspected,
//! filtered by name, resolved to one or two hosts, and then every host is
//! updated on its own: a failure on one host is logged and the next host is
//! still processed. Writes for a host are issued in a fixed order without a
//! transaction, so a failure midway leaves that host partially configured
//! until a later event for it overwrites or removes the keys.

use futures::StreamExt;
use havok_api::keys::CATCH_ALL_PATH;
use havok_api::KeySchema;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::EngineConfig;
use crate::endpoint::Endpoint;
use crate::error::{Result, SyncError};
use crate::filter::NameFilter;
use crate::hosts::resolve_hosts;
use crate::metrics::SyncMetrics;
use crate::runtime::{ContainerDetails, ContainerEvent, ContainerRuntime, EventStatus};
use crate::store::ConfigStore;

pub struct SyncEngine {
    config: EngineConfig,
    keys: KeySchema,
    filter: NameFilter,
    store: Arc<dyn ConfigStore>,
    runtime: Arc<dyn ContainerRuntime>,
    metrics: Arc<SyncMetrics>,
    stop_tx: watch::Sender<bool>,
}

impl SyncEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ConfigStore>,
        runtime: Arc<dyn ContainerRuntime>,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        let keys = KeySchema::new(config.store_prefix.clone());
        let filter = NameFilter::new(&config.name_pattern);
        if !filter.is_valid() {
            metrics.record_error("filter");
        }
        let (stop_tx, _) = watch::channel(false);

        Self {
            config,
            keys,
            filter,
            store,
            runtime,
            metrics,
            stop_tx,
        }
    }

    /// Subscribe to runtime events and process them one at a time until
    /// `stop` is called or the event stream ends.
    pub async fn run(&self) -> Result<()> {
        info!(
            ip = %self.config.host_ip,
            domain = %self.config.root_domain,
            runtime = %self.config.runtime_endpoint,
            store = ?self.config.store_endpoints,
            "Starting engine"
        );

        let mut stop_rx = self.stop_tx.subscribe();
        if *stop_rx.borrow() {
            return Ok(());
        }

        let mut events = self.runtime.events().await?;

        loop {
            let next = tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                next = events.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    let span = info_span!("event", container = %event.id, status = %event.status);
                    self.handle_event(&event).instrument(span).await;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Error reading container event");
                    self.metrics.record_error("runtime");
                }
                None => {
                    info!("Container event stream closed");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Stop consuming events. An event already being handled runs to completion.
    pub fn stop(&self) {
        info!("Stopping engine");
        self.stop_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Apply a single lifecycle event to the store
    pub async fn handle_event(&self, event: &ContainerEvent) {
        match &event.status {
            EventStatus::Other(status) => {
                self.metrics.record_event("other");
                debug!(container = %event.id, status = %status, "Ignoring event");
                return;
            }
            status => self.metrics.record_event(status.as_str()),
        }

        let container = match self.runtime.inspect(&event.id).await {
            Ok(container) => container,
            Err(e) => {
                warn!(container = %event.id, error = %e, "Unable to inspect container");
                self.metrics.record_error("runtime");
                return;
            }
        };

        if !self.filter.matches(&container.name) {
            debug!(name = %container.name, pattern = %self.filter.pattern(), "Container does not match name filter");
            return;
        }

        let hosts = resolve_hosts(
            &container.hostname,
            &container.domainname,
            &self.config.root_domain,
            self.config.root_subdomain.as_deref(),
        );

        if event.status == EventStatus::Start {
            self.on_start(&container, &hosts).await;
        } else if event.status.is_teardown() {
            self.on_teardown(&container, &hosts, &event.status).await;
        }
    }

    async fn on_start(&self, container: &ContainerDetails, hosts: &[String]) {
        // one endpoint per container, even with several published ports
        let Some(port) = container.first_host_port() else {
            let err = SyncError::Validation(format!(
                "container {} has no published port",
                container.name
            ));
            error!(container = %container.id, hosts = ?hosts, error = %err, "Unable to add endpoint; no ports exposed");
            self.metrics.record_error(err.kind());
            return;
        };
        let endpoint = Endpoint::new(self.config.host_ip.clone(), port);

        for host in hosts {
            info!(host = %host, endpoint = %endpoint, "Adding endpoint for host");
            if let Err(e) = self.register(host, &container.name, &endpoint).await {
                self.report(host, &e, "Error adding endpoint for host");
            }
        }
    }

    async fn on_teardown(&self, container: &ContainerDetails, hosts: &[String], status: &EventStatus) {
        for host in hosts {
            // die accompanies stop and destroy; log only once
            if *status == EventStatus::Die {
                info!(host = %host, "Removing endpoint for host");
            }
            if let Err(e) = self.deregister(host, &container.name).await {
                self.report(host, &e, "Error removing endpoint for host");
            }
        }
    }

    /// Write the host, endpoint, location, middlewares and upstream reference
    pub async fn register(&self, host: &str, name: &str, endpoint: &Endpoint) -> Result<()> {
        self.ensure_host(host).await?;

        self.set(&self.keys.endpoint_key(name, host), &endpoint.url())
            .await?;
        self.metrics.endpoints_registered_total.inc();

        self.set(&self.keys.location_path_key(host), CATCH_ALL_PATH)
            .await?;

        if self.config.rate_limit.enabled() {
            let body = self.config.rate_limit.middleware().encode()?;
            self.set(&self.keys.rate_limit_key(host), &body).await?;
        }

        if self.config.conn_limit.enabled() {
            let body = self.config.conn_limit.middleware().encode()?;
            self.set(&self.keys.conn_limit_key(host), &body).await?;
        }

        self.set(
            &self.keys.location_upstream_key(host),
            &KeySchema::upstream_id(host),
        )
        .await
    }

    /// Remove the endpoint and, if the upstream has none left, the upstream and host.
    ///
    /// The emptiness check runs even when the endpoint is already gone, so a
    /// repeated teardown finishes a cascade an earlier one could not.
    pub async fn deregister(&self, host: &str, name: &str) -> Result<()> {
        let endpoint_key = self.keys.endpoint_key(name, host);
        if self.delete_if_present(&endpoint_key).await? {
            self.metrics.endpoints_removed_total.inc();
        } else {
            debug!(host = %host, key = %endpoint_key, "Endpoint already removed");
        }

        let endpoints_key = self.keys.endpoints_key(host);
        let remaining = match self.store.get(&endpoints_key).await {
            Ok(node) => node.nodes.len(),
            Err(e) if e.is_not_found() => 0,
            Err(e) => return Err(SyncError::store(&endpoints_key, e)),
        };

        if remaining > 0 {
            debug!(host = %host, remaining, "Upstream still has endpoints");
            return Ok(());
        }

        self.delete_if_present(&self.keys.upstream_key(host)).await?;
        if self.delete_if_present(&self.keys.host_key(host)).await? {
            info!(host = %host, "Removing host");
            self.metrics.hosts_removed_total.inc();
        }

        Ok(())
    }

    /// Create the host directory unless it already exists
    pub async fn ensure_host(&self, host: &str) -> Result<()> {
        let key = self.keys.host_key(host);
        match self.store.get(&key).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(host = %host, key = %key, "Creating host");
                self.store
                    .create_dir(&key)
                    .await
                    .map_err(|e| SyncError::store(&key, e))
            }
            Err(e) => Err(SyncError::store(&key, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store
            .set(key, value)
            .await
            .map_err(|e| SyncError::store(key, e))
    }

    /// Delete `key`, reporting whether it existed
    async fn delete_if_present(&self, key: &str) -> Result<bool> {
        match self.store.delete(key).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(SyncError::store(key, e)),
        }
    }

    fn report(&self, host: &str, err: &SyncError, message: &str) {
        self.metrics.record_error(err.kind());
        match err {
            SyncError::Store { key, source } => {
                error!(host = %host, key = %key, error = %source, "{}", message)
            }
            other => error!(host = %host, error = %other, "{}", message),
        }
    }
}
