//! Storage collaborators for the enrollment agent
//!
//! Provides:
//! - Lead stores (in-memory, JSON file)
//! - Analytics sink with a bounded in-memory log

pub mod analytics;
pub mod error;
pub mod leads;

use std::sync::Arc;

use enrollment_agent_config::{PersistenceBackend, PersistenceConfig};
use enrollment_agent_core::LeadStore;

pub use analytics::AnalyticsLog;
pub use error::PersistenceError;
pub use leads::{InMemoryLeadStore, JsonFileLeadStore};

/// Build the lead store selected by configuration
pub fn lead_store(config: &PersistenceConfig) -> Arc<dyn LeadStore> {
    match config.backend {
        PersistenceBackend::Memory => {
            tracing::info!("Using in-memory lead store");
            Arc::new(InMemoryLeadStore::new())
        }
        PersistenceBackend::JsonFile => {
            tracing::info!(path = %config.path, "Using JSON file lead store");
            Arc::new(JsonFileLeadStore::new(&config.path))
        }
    }
}

/// Build the analytics sink sized by configuration
pub fn analytics_log(config: &PersistenceConfig) -> Arc<AnalyticsLog> {
    Arc::new(AnalyticsLog::new(config.analytics_capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_backend_is_memory() {
        let store = lead_store(&PersistenceConfig::default());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_analytics_capacity_from_config() {
        let config = PersistenceConfig {
            analytics_capacity: 3,
            ..Default::default()
        };
        assert_eq!(analytics_log(&config).capacity(), 3);
    }
}
