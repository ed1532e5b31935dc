//! Vulcand configuration schema written by havok
//!
//! This library defines the contract with the proxy control plane:
//! - KeySchema: where hosts, locations, upstreams and endpoints live in the store
//! - RateLimit / ConnectionLimit: middleware objects attached to a location

pub mod keys;
pub mod middleware;

pub use keys::KeySchema;
pub use middleware::{ConnectionLimit, ConnectionMiddleware, RateLimit, RequestMiddleware};

/// Default root segment of the vulcand key space
pub const DEFAULT_PREFIX: &str = "vulcand";
