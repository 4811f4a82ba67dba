//! Error types shared across crates

use thiserror::Error;

/// Core errors raised by collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// Lead or analytics storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
