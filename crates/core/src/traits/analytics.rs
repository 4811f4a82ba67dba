//! Analytics sink trait

use crate::analytics::AnalyticsEvent;

/// Fire-and-forget analytics receiver
///
/// `track` must not fail or block the conversation.
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: AnalyticsEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn track(&self, _event: AnalyticsEvent) {}
}
