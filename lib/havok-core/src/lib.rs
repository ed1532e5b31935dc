//! Core synchronization between container lifecycle and the vulcand key space
//!
//! This library provides:
//! - Name filtering and host resolution for containers
//! - Store and runtime abstractions, plus an in-memory store
//! - The sync engine that turns lifecycle events into store mutations

pub mod config;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hosts;
pub mod memory;
pub mod metrics;
pub mod runtime;
pub mod store;

pub use config::{ConnLimitPolicy, EngineConfig, RateLimitPolicy};
pub use endpoint::Endpoint;
pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use filter::NameFilter;
pub use hosts::resolve_hosts;
pub use memory::{MemoryStore, StoreOp};
pub use metrics::SyncMetrics;
pub use runtime::{
    ContainerDetails, ContainerEvent, ContainerRuntime, EventStatus, EventStream, PortBinding,
    RuntimeError,
};
pub use store::{ConfigStore, Node, StoreError};
