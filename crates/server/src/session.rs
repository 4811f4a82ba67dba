//! Session registry
//!
//! Each live conversation is a [`ConversationDriver`] behind an async mutex,
//! keyed by a random id. Idle sessions expire.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};

use enrollment_agent_agent::ConversationDriver;

use crate::ServerError;

/// One visitor's conversation
pub struct ChatSession {
    pub id: String,
    pub driver: Mutex<ConversationDriver>,
    created_at: Instant,
    last_activity: RwLock<Instant>,
}

impl ChatSession {
    fn new(id: String, driver: ConversationDriver) -> Self {
        let now = Instant::now();
        Self {
            id,
            driver: Mutex::new(driver),
            created_at: now,
            last_activity: RwLock::new(now),
        }
    }

    /// Mark the session as active
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn idle(&self) -> Duration {
        self.last_activity.read().elapsed()
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.idle() > timeout
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<ChatSession>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(
            max_sessions,
            Duration::from_secs(3600),
            Duration::from_secs(300),
        )
    }

    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    /// Periodically drop expired sessions until the returned sender sends `true`
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Session cleanup"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Register a new conversation
    pub fn create(&self, driver: ConversationDriver) -> Result<Arc<ChatSession>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);
            if sessions.len() >= self.max_sessions {
                tracing::warn!(max = self.max_sessions, "Session limit reached");
                return Err(ServerError::Capacity);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(ChatSession::new(id.clone(), driver));
        sessions.insert(id.clone(), Arc::clone(&session));

        tracing::info!(session_id = %id, active = sessions.len(), "Created session");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session; returns false when it did not exist
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Drop expired sessions, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<ChatSession>>) -> usize {
        let timeout = self.session_timeout;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = !session.is_expired(timeout);
            if !keep {
                tracing::info!(session_id = %id, "Expired session");
            }
            keep
        });
        before - sessions.len()
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrollment_agent_agent::{ConversationEngine, DriverConfig};
    use enrollment_agent_core::NoopAnalytics;
    use enrollment_agent_persistence::InMemoryLeadStore;

    fn driver() -> ConversationDriver {
        ConversationDriver::new(
            Arc::new(ConversationEngine::default()),
            Arc::new(InMemoryLeadStore::new()),
            Arc::new(NoopAnalytics),
            DriverConfig::default(),
        )
    }

    #[test]
    fn test_session_create_and_get() {
        let manager = SessionManager::new(10);
        let session = manager.create(driver()).unwrap();
        assert!(!session.is_expired(Duration::from_secs(60)));

        let retrieved = manager.get(&session.id).unwrap();
        assert_eq!(retrieved.id, session.id);
        assert_eq!(manager.list(), vec![session.id.clone()]);
    }

    #[test]
    fn test_session_remove() {
        let manager = SessionManager::new(10);
        let id = manager.create(driver()).unwrap().id.clone();

        assert!(manager.remove(&id));
        assert!(manager.get(&id).is_none());
        assert!(!manager.remove(&id));
    }

    #[test]
    fn test_capacity_limit() {
        let manager = SessionManager::new(1);
        manager.create(driver()).unwrap();
        assert!(matches!(manager.create(driver()), Err(ServerError::Capacity)));
    }

    #[test]
    fn test_expired_sessions_free_capacity() {
        let manager = SessionManager::with_config(1, Duration::ZERO, Duration::from_secs(60));
        let first = manager.create(driver()).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let second = manager.create(driver()).unwrap();
        assert!(manager.get(&first.id).is_none());
        assert_eq!(manager.count(), 1);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_touch_resets_idle_time() {
        let manager = SessionManager::new(10);
        let session = manager.create(driver()).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        session.touch();
        assert!(session.idle() < session.age());
    }
}
