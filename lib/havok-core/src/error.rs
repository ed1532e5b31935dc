use thiserror::Error;

use crate::runtime::RuntimeError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Store error on {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid name pattern: {0}")]
    Filter(#[from] regex::Error),

    #[error("Serialization error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    pub(crate) fn store(key: &str, source: StoreError) -> Self {
        SyncError::Store {
            key: key.to_string(),
            source,
        }
    }

    /// Short label used for the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Store { .. } => "store",
            SyncError::Validation(_) => "validation",
            SyncError::Filter(_) => "filter",
            SyncError::Encode(_) => "encode",
            SyncError::Runtime(_) => "runtime",
            SyncError::Config(_) => "config",
        }
    }
}
