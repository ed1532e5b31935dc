//! etcd v2 keys API backend for the configuration store
pub mod client;
pub mod wire;

pub use client::EtcdClient;
