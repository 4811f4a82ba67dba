//! Analytics sink backed by a bounded in-memory log

use std::collections::VecDeque;

use parking_lot::Mutex;

use enrollment_agent_core::{AnalyticsEvent, AnalyticsSink};

/// Keeps the most recent events; the oldest are dropped once full
#[derive(Debug)]
pub struct AnalyticsLog {
    capacity: usize,
    events: Mutex<VecDeque<AnalyticsEvent>>,
}

impl AnalyticsLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Up to `limit` most recent events, oldest first
    pub fn recent(&self, limit: usize) -> Vec<AnalyticsEvent> {
        let events = self.events.lock();
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }
}

impl AnalyticsSink for AnalyticsLog {
    fn track(&self, event: AnalyticsEvent) {
        tracing::info!(
            event = event.event.as_str(),
            payload = ?event.payload,
            "Analytics event"
        );
        metrics::counter!(
            "enrollment_analytics_events_total",
            "event" => event.event.as_str()
        )
        .increment(1);

        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.lock();
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use enrollment_agent_core::AnalyticsEventKind;

    fn event(kind: AnalyticsEventKind, minute: u32) -> AnalyticsEvent {
        AnalyticsEvent::new(kind, Utc.with_ymd_and_hms(2024, 6, 1, 10, minute, 0).unwrap())
    }

    #[test]
    fn test_recent_returns_newest_in_order() {
        let log = AnalyticsLog::new(10);
        log.track(event(AnalyticsEventKind::ConversationStarted, 0));
        log.track(event(AnalyticsEventKind::UserTypeSelected, 1));
        log.track(event(AnalyticsEventKind::DemoClicked, 2));

        let recent: Vec<_> = log.recent(2).into_iter().map(|e| e.event).collect();
        assert_eq!(
            recent,
            vec![
                AnalyticsEventKind::UserTypeSelected,
                AnalyticsEventKind::DemoClicked
            ]
        );
        assert_eq!(log.recent(100).len(), 3);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let log = AnalyticsLog::new(2);
        for minute in 0..5 {
            log.track(event(AnalyticsEventKind::LeadCompleted, minute));
        }
        assert_eq!(log.len(), 2);
        let recent = log.recent(10);
        assert_eq!(recent[0].timestamp.format("%M").to_string(), "03");
        assert_eq!(recent[1].timestamp.format("%M").to_string(), "04");
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let log = AnalyticsLog::new(0);
        log.track(event(AnalyticsEventKind::ConversationStarted, 0));
        assert!(log.is_empty());
    }
}
