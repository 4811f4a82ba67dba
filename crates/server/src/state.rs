//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;
use std::time::Duration;

use enrollment_agent_agent::{ConversationDriver, ConversationEngine, DriverConfig};
use enrollment_agent_config::Settings;
use enrollment_agent_core::{LeadStore, SystemClock, VisitorCategory};
use enrollment_agent_persistence::{analytics_log, lead_store, AnalyticsLog};

use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub engine: Arc<ConversationEngine>,
    pub sessions: Arc<SessionManager>,
    pub leads: Arc<dyn LeadStore>,
    pub analytics: Arc<AnalyticsLog>,
}

impl AppState {
    /// Build state with the stores selected by configuration
    pub fn new(config: Settings) -> Self {
        let leads = lead_store(&config.persistence);
        let analytics = analytics_log(&config.persistence);
        Self::with_stores(config, leads, analytics)
    }

    /// Build state around explicit stores
    pub fn with_stores(
        config: Settings,
        leads: Arc<dyn LeadStore>,
        analytics: Arc<AnalyticsLog>,
    ) -> Self {
        let engine = ConversationEngine::new(config.scoring.clone(), Arc::new(SystemClock));
        let sessions = SessionManager::with_config(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_timeout_seconds),
            Duration::from_secs(300),
        );
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            sessions: Arc::new(sessions),
            leads,
            analytics,
        }
    }

    /// Replace the engine, e.g. with one on a fixed clock
    pub fn with_engine(mut self, engine: ConversationEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Start a driver wired to the shared engine and stores
    pub fn new_driver(&self, category: Option<VisitorCategory>) -> ConversationDriver {
        let config = DriverConfig::from(&self.config.conversation);
        match category {
            Some(category) => ConversationDriver::with_category(
                Arc::clone(&self.engine),
                Arc::clone(&self.leads),
                self.analytics.clone(),
                config,
                category,
            ),
            None => ConversationDriver::new(
                Arc::clone(&self.engine),
                Arc::clone(&self.leads),
                self.analytics.clone(),
                config,
            ),
        }
    }
}
