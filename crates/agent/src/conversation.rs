//! Conversation driver
//!
//! Owns one session and feeds visitor input through the engine. Transitions
//! commit immediately; the rendered reply is then held as pending until its
//! composing delay runs out, and input arriving meanwhile is ignored. A reply
//! nobody collected is released by the next submit once it is due. Reaching
//! Complete for the first time finalizes the lead, stores it (best effort),
//! and reports it to analytics.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use enrollment_agent_config::ConversationConfig;
use enrollment_agent_core::{
    AnalyticsEvent, AnalyticsEventKind, AnalyticsSink, CallToAction, LeadRecord, LeadStore,
    Message, Session, Step, VisitorCategory,
};

use crate::engine::{AdvanceOutcome, Content, ConversationEngine};

/// Driver settings
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Composing delay before a reply is released
    pub reply_delay: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(800),
        }
    }
}

impl From<&ConversationConfig> for DriverConfig {
    fn from(config: &ConversationConfig) -> Self {
        Self {
            reply_delay: config.reply_delay(),
        }
    }
}

/// Result of submitting visitor input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A reply is still pending; the input was dropped
    Ignored,
    /// Validation failed; the session is unchanged
    Rejected { step: Step, message: String },
    /// The transition was committed
    Accepted {
        step: Step,
        /// Delay before the pending reply should be shown
        reply_delay: Duration,
        /// This turn completed the conversation
        lead_completed: bool,
    },
}

/// Rendered reply waiting out its composing delay
#[derive(Debug, Clone)]
struct PendingReply {
    content: Content,
    due: Instant,
}

impl PendingReply {
    fn is_due(&self) -> bool {
        Instant::now() >= self.due
    }
}

pub struct ConversationDriver {
    engine: Arc<ConversationEngine>,
    session: Session,
    store: Arc<dyn LeadStore>,
    analytics: Arc<dyn AnalyticsSink>,
    config: DriverConfig,
    pending: Option<PendingReply>,
    lead: Option<LeadRecord>,
}

impl ConversationDriver {
    /// Start a conversation at Welcome
    pub fn new(
        engine: Arc<ConversationEngine>,
        store: Arc<dyn LeadStore>,
        analytics: Arc<dyn AnalyticsSink>,
        config: DriverConfig,
    ) -> Self {
        let session = engine.initialize_session();
        let mut driver = Self {
            engine,
            session,
            store,
            analytics,
            config,
            pending: None,
            lead: None,
        };
        driver.open();
        driver
    }

    /// Start a conversation with the category already chosen
    ///
    /// Skips the classification question and opens at the category's first
    /// collection step.
    pub fn with_category(
        engine: Arc<ConversationEngine>,
        store: Arc<dyn LeadStore>,
        analytics: Arc<dyn AnalyticsSink>,
        config: DriverConfig,
        category: VisitorCategory,
    ) -> Self {
        let mut driver = Self::new(engine, store, analytics, config);
        if category.is_known() {
            driver.session = driver.engine.preselect(&driver.session, category);
            driver.track_category(category, "preselect");
            let content = driver.engine.render_content_for(&driver.session);
            driver.post_reply(content);
        }
        driver
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Lead derived when the conversation completed
    pub fn lead(&self) -> Option<&LeadRecord> {
        self.lead.as_ref()
    }

    /// True while a reply is still inside its composing delay
    pub fn is_reply_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| !p.is_due())
    }

    /// Content for the current step
    pub fn current_content(&self) -> Content {
        self.engine.render_content_for(&self.session)
    }

    /// Submit visitor input
    pub async fn submit(&mut self, raw: &str) -> TurnOutcome {
        self.release_overdue();
        if self.pending.is_some() {
            tracing::debug!(step = %self.session.current_step, "Reply pending, input ignored");
            return TurnOutcome::Ignored;
        }

        let advance = self.engine.advance(&self.session, raw);
        let transition = match advance.outcome {
            AdvanceOutcome::Rejected(rejection) => {
                metrics::counter!(
                    "enrollment_validation_rejections_total",
                    "step" => rejection.step.as_key()
                )
                .increment(1);
                self.session = advance.session;
                return TurnOutcome::Rejected {
                    step: rejection.step,
                    message: rejection.message,
                };
            }
            AdvanceOutcome::Transitioned(transition) => transition,
        };

        if transition.from.is_terminal() {
            return TurnOutcome::Accepted {
                step: Step::Complete,
                reply_delay: Duration::ZERO,
                lead_completed: false,
            };
        }

        self.session = advance.session;

        if transition.selected_category() {
            self.track_category(transition.category, "message");
        }
        if let Some(cta) = transition.call_to_action {
            self.track_call_to_action(cta);
        }

        let lead_completed = transition.completed() && self.complete().await;

        self.pending = Some(PendingReply {
            content: self.engine.render_content_for(&self.session),
            due: Instant::now() + self.config.reply_delay,
        });

        TurnOutcome::Accepted {
            step: self.session.current_step,
            reply_delay: self.config.reply_delay,
            lead_completed,
        }
    }

    /// Release the pending reply, appending it to the message log
    pub fn take_reply(&mut self) -> Option<Content> {
        let content = self.pending.take()?.content;
        self.session.message_log.push(Message::assistant(
            content.text.clone(),
            content.suggested_replies.clone(),
        ));
        Some(content)
    }

    /// Wait out the composing delay, then release the pending reply
    pub async fn await_reply(&mut self) -> Option<Content> {
        let due = self.pending.as_ref()?.due;
        tokio::time::sleep_until(due).await;
        self.take_reply()
    }

    /// Release a reply whose delay ran out without anyone collecting it
    fn release_overdue(&mut self) {
        if self.pending.as_ref().is_some_and(PendingReply::is_due) {
            tracing::debug!(step = %self.session.current_step, "Releasing uncollected reply");
            self.take_reply();
        }
    }

    /// Discard everything and start over at Welcome
    pub fn restart(&mut self) {
        tracing::debug!(step = %self.session.current_step, "Conversation restarted");
        self.session = self.engine.initialize_session();
        self.pending = None;
        self.lead = None;
        self.open();
    }

    /// Record an explicit call-to-action click from the UI
    pub fn record_call_to_action(&mut self, cta: CallToAction) {
        self.track_call_to_action(cta);
    }

    fn open(&mut self) {
        self.analytics.track(AnalyticsEvent::new(
            AnalyticsEventKind::ConversationStarted,
            self.session.started_at,
        ));
        let content = self.engine.render_content_for(&self.session);
        self.post_reply(content);
    }

    fn post_reply(&mut self, content: Content) {
        self.session
            .message_log
            .push(Message::assistant(content.text, content.suggested_replies));
    }

    /// Finalize and store the lead; returns true when a lead was produced
    async fn complete(&mut self) -> bool {
        if self.lead.is_some() {
            return false;
        }
        let Some(lead) = self.engine.finalize_lead(&self.session) else {
            return false;
        };

        if let Err(e) = self.store.append(&lead).await {
            tracing::warn!(error = %e, "Failed to store completed lead");
        }

        tracing::info!(
            category = lead.category.display_name(),
            score = lead.score,
            temperature = %lead.temperature,
            booked = lead.booking_confirmed,
            "Lead completed"
        );
        metrics::counter!(
            "enrollment_leads_completed_total",
            "temperature" => lead.temperature.as_str()
        )
        .increment(1);

        self.analytics.track(
            AnalyticsEvent::new(AnalyticsEventKind::LeadCompleted, lead.completed_at)
                .with("user_type", lead.category.display_name())
                .with("lead_score", lead.score)
                .with("lead_temperature", lead.temperature)
                .with("booking_confirmed", lead.booking_confirmed),
        );

        self.lead = Some(lead);
        true
    }

    fn track_category(&self, category: VisitorCategory, source: &str) {
        self.analytics.track(
            AnalyticsEvent::new(AnalyticsEventKind::UserTypeSelected, self.engine.now())
                .with("user_type", category.display_name())
                .with("source", source),
        );
    }

    fn track_call_to_action(&self, cta: CallToAction) {
        self.analytics.track(
            AnalyticsEvent::new(
                AnalyticsEventKind::for_call_to_action(cta),
                self.engine.now(),
            )
            .with("user_type", self.session.visitor_category.display_name())
            .with("action", cta.as_str()),
        );
    }
}
