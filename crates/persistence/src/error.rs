//! Persistence errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Lead file exists but does not hold a JSON array of leads
    #[error("Corrupt lead file {path}: {message}")]
    Corrupt { path: String, message: String },
}

impl From<PersistenceError> for enrollment_agent_core::Error {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Io(e) => Self::Io(e),
            PersistenceError::Serialization(e) => Self::Serialization(e),
            other => Self::Storage(other.to_string()),
        }
    }
}
