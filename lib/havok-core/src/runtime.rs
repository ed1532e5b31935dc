//! Container runtime abstraction: lifecycle events and inspection

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Container not found: {0}")]
    NotFound(String),

    #[error("Event stream error: {0}")]
    Stream(String),

    #[error("Runtime API error: {0}")]
    Api(String),
}

/// Lifecycle transition reported by the runtime
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventStatus {
    Start,
    Stop,
    Die,
    Destroy,
    Other(String),
}

impl EventStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "start" => EventStatus::Start,
            "stop" => EventStatus::Stop,
            "die" => EventStatus::Die,
            "destroy" => EventStatus::Destroy,
            other => EventStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventStatus::Start => "start",
            EventStatus::Stop => "stop",
            EventStatus::Die => "die",
            EventStatus::Destroy => "destroy",
            EventStatus::Other(s) => s,
        }
    }

    /// Whether this transition removes the container's endpoints
    pub fn is_teardown(&self) -> bool {
        matches!(self, EventStatus::Stop | EventStatus::Die | EventStatus::Destroy)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle event for one container instance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerEvent {
    pub id: String,
    pub status: EventStatus,
}

impl ContainerEvent {
    pub fn new(id: impl Into<String>, status: EventStatus) -> Self {
        Self {
            id: id.into(),
            status,
        }
    }
}

/// A published host binding of a container port
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortBinding {
    pub host_ip: Option<String>,
    pub host_port: String,
}

/// The parts of an inspected container the engine uses
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerDetails {
    pub id: String,
    /// Display name without the runtime's leading `/`
    pub name: String,
    pub hostname: String,
    pub domainname: String,
    /// Container port (e.g. `80/tcp`) to its published bindings
    pub ports: BTreeMap<String, Vec<PortBinding>>,
}

impl ContainerDetails {
    /// Host port of the first container port that has a published binding
    pub fn first_host_port(&self) -> Option<&str> {
        self.ports
            .values()
            .filter_map(|bindings| bindings.first())
            .map(|b| b.host_port.as_str())
            .find(|p| !p.is_empty())
    }
}

pub type EventStream = BoxStream<'static, Result<ContainerEvent, RuntimeError>>;

/// Source of container lifecycle events
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Subscribe to container events, in delivery order
    async fn events(&self) -> Result<EventStream, RuntimeError>;

    /// Fetch current metadata for a container
    async fn inspect(&self, id: &str) -> Result<ContainerDetails, RuntimeError>;
}
