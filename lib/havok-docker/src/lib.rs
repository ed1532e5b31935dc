//! Docker backend for container events and inspection
pub mod client;
pub mod convert;

pub use client::DockerRuntime;
