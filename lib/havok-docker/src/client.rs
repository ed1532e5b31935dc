//! Docker client wrapper implementing the container runtime

use async_trait::async_trait;
use bollard::container::InspectContainerOptions;
use bollard::errors::Error as BollardError;
use bollard::system::EventsOptions;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::channel::mpsc;
use futures::StreamExt;
use havok_core::{ContainerDetails, ContainerRuntime, EventStream, RuntimeError};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::convert::{details_from_inspect, event_from_message};

/// Seconds before a Docker API request times out
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// DockerRuntime wraps a bollard client
pub struct DockerRuntime {
    docker: Docker,
    endpoint: String,
}

impl DockerRuntime {
    /// Connect to `unix://` sockets or `tcp://` / `http://` daemons
    pub fn connect(endpoint: &str) -> Result<Self, RuntimeError> {
        let docker = if endpoint.starts_with("unix://") {
            Docker::connect_with_unix(endpoint, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION)
        } else {
            let addr = endpoint.replacen("tcp://", "http://", 1);
            Docker::connect_with_http(&addr, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION)
        }
        .map_err(|e| RuntimeError::Api(format!("unable to connect to docker at {}: {}", endpoint, e)))?;

        Ok(Self {
            docker,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check that the daemon answers
    pub async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::Api(format!("docker ping failed: {}", e)))
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn events(&self) -> Result<EventStream, RuntimeError> {
        let mut filters = HashMap::new();
        filters.insert("type".to_string(), vec!["container".to_string()]);
        let options = EventsOptions::<String> {
            filters,
            ..Default::default()
        };

        let docker = self.docker.clone();
        let (tx, rx) = mpsc::unbounded();

        // forward until the subscriber drops its end
        tokio::spawn(async move {
            let mut events = Box::pin(docker.events(Some(options)));
            while let Some(item) = events.next().await {
                let item = match item {
                    Ok(message) => match event_from_message(message) {
                        Some(event) => Ok(event),
                        None => continue,
                    },
                    Err(e) => Err(RuntimeError::Stream(e.to_string())),
                };
                if tx.unbounded_send(item).is_err() {
                    debug!("Event subscriber gone, closing docker event stream");
                    return;
                }
            }
            warn!("Docker event stream ended");
        });

        info!(endpoint = %self.endpoint, "Subscribed to docker events");
        Ok(rx.boxed())
    }

    async fn inspect(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        match self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => Ok(details_from_inspect(id, response)),
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => Err(RuntimeError::NotFound(id.to_string())),
            Err(e) => Err(RuntimeError::Api(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_unix_is_lazy() {
        // no daemon is contacted until the first request
        let runtime = DockerRuntime::connect("unix:///tmp/havok-test-missing.sock").unwrap();
        assert_eq!(runtime.endpoint(), "unix:///tmp/havok-test-missing.sock");
    }

    #[tokio::test]
    async fn test_connect_tcp() {
        let runtime = DockerRuntime::connect("tcp://127.0.0.1:2375").unwrap();
        assert_eq!(runtime.endpoint(), "tcp://127.0.0.1:2375");
    }

    #[tokio::test]
    async fn test_inspect_without_daemon_is_an_api_error() {
        let runtime = DockerRuntime::connect("unix:///tmp/havok-test-missing.sock").unwrap();
        match runtime.inspect("abc").await {
            Err(RuntimeError::Api(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
