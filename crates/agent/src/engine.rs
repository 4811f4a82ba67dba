//! Conversation engine
//!
//! Public contract consumed by the driver and any UI:
//! - [`ConversationEngine::initialize_session`]
//! - [`ConversationEngine::advance`] (validate, transition, commit)
//! - [`ConversationEngine::render_content_for`] (pure rendering)
//! - [`ConversationEngine::finalize_lead`]
//!
//! Every operation is total. Sessions are values; `advance` returns a new one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use enrollment_agent_config::ScoringConfig;
use enrollment_agent_core::{
    Clock, FieldKey, LeadRecord, Message, Session, Step, SystemClock, VisitorCategory,
};

use crate::catalog;
use crate::lead_scoring::LeadScorer;
use crate::transition::{transition, StepTransition};
use crate::validation::{validate, ValidationRejection};

const PROGRAM_OVERVIEW: &str = "No worries, here's a quick overview of our core STEM programs:\n\n\
\u{2022} Robotics & Coding Program (Grades 1\u{2013}9): hands-on coding and robotics projects integrated into the school curriculum.\n\
\u{2022} Young Product Designer Program (YPDP) (Grades 3\u{2013}9): kids design and build real tech products using hardware kits and block-based coding.\n\
\u{2022} Higher Order Thinking Skills (HOTS) (Grades 1\u{2013}8): strengthens critical thinking, logical reasoning, and problem-solving.\n\n";

const PARENT_ACTIONS: &[&str] = &[
    "Book FREE Live Demo",
    "Talk to Academic Counselor",
    "Download Brochure",
];

const INSTITUTION_ACTIONS: &[&str] = &[
    "Schedule Partnership Call",
    "Get Proposal Deck",
    "Book Partnership Demo",
];

/// What the UI should show for the current step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub text: String,
    pub suggested_replies: Vec<String>,
    pub step_number: u8,
    pub total_steps: u8,
}

/// How an input was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Transitioned(StepTransition),
    Rejected(ValidationRejection),
}

/// Result of [`ConversationEngine::advance`]
#[derive(Debug, Clone)]
pub struct Advance {
    pub session: Session,
    pub outcome: AdvanceOutcome,
}

impl Advance {
    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, AdvanceOutcome::Rejected(_))
    }
}

/// Stateless conversation engine
pub struct ConversationEngine {
    scorer: LeadScorer,
    clock: Arc<dyn Clock>,
}

impl ConversationEngine {
    pub fn new(scoring: ScoringConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            scorer: LeadScorer::new(scoring),
            clock,
        }
    }

    pub fn scorer(&self) -> &LeadScorer {
        &self.scorer
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fresh session at Welcome
    pub fn initialize_session(&self) -> Session {
        Session::new(self.clock.now())
    }

    /// Jump straight to a category's first collection step
    ///
    /// Only applies while the visitor is still unclassified; otherwise the
    /// session is returned unchanged.
    pub fn preselect(&self, session: &Session, category: VisitorCategory) -> Session {
        let Some(first) = category.first_step() else {
            return session.clone();
        };
        if !session.current_step.is_category_select() || session.visitor_category.is_known() {
            return session.clone();
        }
        let mut next = session.clone();
        next.visitor_category = category;
        next.current_step = first;
        next
    }

    /// Validate and apply one visitor input
    ///
    /// A session whose step and category disagree is restarted at Welcome,
    /// but only when the input is accepted; a rejection always returns the
    /// caller's session untouched.
    pub fn advance(&self, session: &Session, raw: &str) -> Advance {
        let base = if session.is_consistent() {
            session.clone()
        } else {
            tracing::warn!(
                step = %session.current_step,
                category = ?session.visitor_category,
                "Inconsistent session, restarting at welcome"
            );
            let mut fresh = Session::new(session.started_at);
            fresh.message_log = session.message_log.clone();
            fresh
        };

        if let Err(rejection) = validate(base.current_step, raw) {
            tracing::debug!(step = %base.current_step, reason = %rejection.message, "Input rejected");
            return Advance {
                session: session.clone(),
                outcome: AdvanceOutcome::Rejected(rejection),
            };
        }

        let t = transition(base.current_step, base.visitor_category, raw, &self.scorer);

        if base.current_step.is_terminal() {
            return Advance {
                session: base,
                outcome: AdvanceOutcome::Transitioned(t),
            };
        }

        let mut next = base;
        next.message_log.push(Message::visitor(raw.trim()));
        if !next.visitor_category.is_known() {
            next.visitor_category = t.category;
        }
        if let Some((key, value)) = &t.field {
            next.fields.entry(*key).or_insert_with(|| value.clone());
        }
        next.score += t.score_delta;
        next.score_max += t.max_delta;
        if let Some(booked) = t.booking_confirmed {
            next.booking_confirmed = booked;
        }
        if t.call_to_action.is_some() {
            next.call_to_action = t.call_to_action;
        }
        next.current_step = t.to;
        if t.completed() && next.completed_at.is_none() {
            next.completed_at = Some(self.clock.now());
        }

        tracing::debug!(
            from = %t.from,
            to = %t.to,
            score = next.score,
            "Step transition"
        );

        Advance {
            session: next,
            outcome: AdvanceOutcome::Transitioned(t),
        }
    }

    /// Content for the session's current step
    pub fn render_content_for(&self, session: &Session) -> Content {
        let spec = catalog::lookup(session.current_step);

        let (text, suggested_replies) = match session.current_step {
            Step::Recommendation => recommendation(session),
            Step::Complete => (closing_message(session), Vec::new()),
            Step::ParentCity if wants_overview(session) => (
                format!("{PROGRAM_OVERVIEW}{}", spec.prompt),
                spec.suggested_replies(),
            ),
            _ => (spec.prompt.to_string(), spec.suggested_replies()),
        };

        Content {
            text,
            suggested_replies,
            step_number: spec.step_number,
            total_steps: spec.total_steps,
        }
    }

    /// Derive the lead record for a completed session
    ///
    /// Pure: calling it twice on the same session yields identical records.
    pub fn finalize_lead(&self, session: &Session) -> Option<LeadRecord> {
        if !session.is_complete() || !session.visitor_category.is_known() {
            return None;
        }

        let category = session.visitor_category;
        let score = self.scorer.score(category, &session.fields);
        let contact = |key: FieldKey| session.field(key).unwrap_or_default().to_string();
        let details = session
            .fields
            .iter()
            .filter(|(key, _)| !key.is_contact())
            .map(|(key, value)| (*key, value.clone()))
            .collect();

        Some(LeadRecord {
            category,
            name: contact(FieldKey::Name),
            phone: contact(FieldKey::Phone),
            email: contact(FieldKey::Email),
            city: contact(FieldKey::City),
            details,
            score: score.total,
            score_max: score.max,
            temperature: score.temperature,
            booking_confirmed: session.booking_confirmed,
            call_to_action: session.call_to_action,
            started_at: session.started_at,
            completed_at: session.completed_at.unwrap_or(session.started_at),
        })
    }
}

impl Default for ConversationEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default(), Arc::new(SystemClock))
    }
}

fn wants_overview(session: &Session) -> bool {
    session
        .field(FieldKey::Interest)
        .is_some_and(|interest| interest.to_lowercase().contains("not sure"))
}

fn owned(replies: &[&str]) -> Vec<String> {
    replies.iter().map(|r| r.to_string()).collect()
}

fn recommendation(session: &Session) -> (String, Vec<String>) {
    match session.visitor_category {
        VisitorCategory::Parent => {
            let grade = session
                .field(FieldKey::Grade)
                .unwrap_or("your child's grade");
            (
                format!(
                    "Based on {grade}, our Computational Thinking + Coding pathway is ideal for your child. What would you like to do next?"
                ),
                owned(PARENT_ACTIONS),
            )
        }
        VisitorCategory::Institution => {
            let strength = session.field(FieldKey::Strength).unwrap_or("your");
            let curriculum = session.field(FieldKey::Curriculum).unwrap_or("current");
            (
                format!(
                    "Based on your school's needs ({strength} students, {curriculum} curriculum), I recommend our Integrated STEM Curriculum Partnership Model. What would you like to do next?"
                ),
                owned(INSTITUTION_ACTIONS),
            )
        }
        VisitorCategory::Unknown => (
            catalog::lookup(Step::Recommendation).prompt.to_string(),
            Vec::new(),
        ),
    }
}

fn closing_message(session: &Session) -> String {
    match (session.visitor_category, session.booking_confirmed) {
        (VisitorCategory::Parent, true) => "\u{1F389} Demo booked! We'll send a calendar link to your email and call you to confirm. Can't wait to show you the perfect STEM program for your child!".to_string(),
        (VisitorCategory::Parent, false) => "Perfect! We've noted your details. Our team will call you within 24 hours to discuss the best STEM program for your child. Have a great day!".to_string(),
        (VisitorCategory::Institution, true) => "\u{1F389} Partnership demo booked! We'll send a calendar link to your email and our partnership manager will call you to confirm. Looking forward to partnering with your school!".to_string(),
        (VisitorCategory::Institution, false) => "Perfect! We've noted your partnership inquiry. Our partnership team will call you within 24 hours to discuss how WizKlub can benefit your students. Have a great day!".to_string(),
        (VisitorCategory::Unknown, _) => catalog::lookup(Step::Complete).prompt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use enrollment_agent_core::{FixedClock, Temperature};

    fn engine() -> ConversationEngine {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        ConversationEngine::new(ScoringConfig::default(), Arc::new(clock))
    }

    fn run(engine: &ConversationEngine, inputs: &[&str]) -> Session {
        inputs.iter().fold(engine.initialize_session(), |session, input| {
            let advance = engine.advance(&session, input);
            assert!(!advance.is_rejected(), "{input:?} rejected");
            advance.session
        })
    }

    #[test]
    fn test_initialize_session() {
        let engine = engine();
        let session = engine.initialize_session();
        assert_eq!(session.current_step, Step::Welcome);
        assert_eq!(session.visitor_category, VisitorCategory::Unknown);
        assert!(session.fields.is_empty());
        assert_eq!(session.score, 0);
    }

    #[test]
    fn test_rejection_leaves_session_unchanged() {
        let engine = engine();
        let session = run(&engine, &["parent", "Asha", "5", "Coding", "Pune"]);
        let advance = engine.advance(&session, "not-an-email");
        assert_eq!(advance.session, session);
        match advance.outcome {
            AdvanceOutcome::Rejected(rejection) => {
                assert_eq!(rejection.step, Step::ParentEmail);
                assert!(!rejection.message.is_empty());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_rejection_on_inconsistent_session_keeps_it() {
        let engine = engine();
        let mut corrupt = run(&engine, &["parent", "Asha"]);
        corrupt.current_step = Step::InstitutionRole;

        let advance = engine.advance(&corrupt, "   ");
        assert!(advance.is_rejected());
        assert_eq!(advance.session, corrupt);

        let advance = engine.advance(&corrupt, "hello");
        assert!(!advance.is_rejected());
        assert_eq!(advance.session.current_step, Step::CategorySelect);
    }

    #[test]
    fn test_visitor_messages_logged_on_accept() {
        let engine = engine();
        let session = run(&engine, &["parent", "  Asha "]);
        let texts: Vec<&str> = session.message_log.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["parent", "Asha"]);
        assert_eq!(session.field(FieldKey::Name), Some("Asha"));
    }

    #[test]
    fn test_score_accumulates_and_max_tracks_traversed_weights() {
        let engine = engine();
        let mut session = run(&engine, &["parent", "Asha"]);
        let mut last_score = 0;
        for input in ["5", "Coding", "Pune", "a@b.com", "9876543210"] {
            session = engine.advance(&session, input).session;
            assert!(session.score >= last_score);
            assert!(session.score <= session.score_max);
            last_score = session.score;
        }
        assert_eq!(session.score, 55);
        assert_eq!(session.score_max, 55);
        assert_eq!(session.current_step, Step::Recommendation);
    }

    #[test]
    fn test_complete_is_absorbing() {
        let engine = engine();
        let session = run(
            &engine,
            &["parent", "Asha", "5", "Coding", "Pune", "a@b.com", "9876543210", "book demo"],
        );
        assert!(session.is_complete());
        let again = engine.advance(&session, "hello?");
        assert_eq!(again.session, session);
        let empty = engine.advance(&session, "");
        assert!(!empty.is_rejected());
        assert_eq!(empty.session, session);
    }

    #[test]
    fn test_inconsistent_session_restarts() {
        let engine = engine();
        let mut session = engine.initialize_session();
        session.current_step = Step::InstitutionRole;
        session.visitor_category = VisitorCategory::Parent;

        let advance = engine.advance(&session, "parent");
        assert_eq!(advance.session.current_step, Step::ParentName);
        assert_eq!(advance.session.visitor_category, VisitorCategory::Parent);
    }

    #[test]
    fn test_preselect() {
        let engine = engine();
        let session = engine.preselect(&engine.initialize_session(), VisitorCategory::Institution);
        assert_eq!(session.current_step, Step::InstitutionName);
        assert!(session.is_consistent());

        let unchanged = engine.preselect(&session, VisitorCategory::Parent);
        assert_eq!(unchanged, session);
    }

    #[test]
    fn test_render_progress_and_replies() {
        let engine = engine();
        let session = run(&engine, &["parent", "Asha"]);
        let content = engine.render_content_for(&session);
        assert_eq!(content.step_number, 2);
        assert_eq!(content.total_steps, 6);
        assert_eq!(content.suggested_replies.len(), 4);

        let welcome = engine.render_content_for(&engine.initialize_session());
        assert_eq!((welcome.step_number, welcome.total_steps), (0, 0));
        assert!(welcome.text.contains("Welcome to WizKlub"));
    }

    #[test]
    fn test_not_sure_interest_prefixes_overview() {
        let engine = engine();
        let session = run(&engine, &["parent", "Asha", "5", "Not Sure"]);
        let content = engine.render_content_for(&session);
        assert!(content.text.starts_with("No worries"));
        assert!(content.text.ends_with("Which city are you located in?"));

        let session = run(&engine, &["parent", "Asha", "5", "Coding"]);
        let content = engine.render_content_for(&session);
        assert_eq!(content.text, "Which city are you located in?");
    }

    #[test]
    fn test_recommendation_is_category_specific() {
        let engine = engine();
        let session = run(
            &engine,
            &["parent", "Asha", "Grades 3\u{2013}5", "Coding", "Pune", "a@b.com", "9876543210"],
        );
        let content = engine.render_content_for(&session);
        assert!(content.text.contains("Grades 3\u{2013}5"));
        assert_eq!(content.suggested_replies[0], "Book FREE Live Demo");

        let session = run(
            &engine,
            &["school", "Ravi", "Principal", "1200", "CBSE", "Both", "Mysuru", "r@s.org", "9876543210"],
        );
        let content = engine.render_content_for(&session);
        assert!(content.text.contains("1200 students, CBSE curriculum"));
        assert_eq!(content.suggested_replies[0], "Schedule Partnership Call");
    }

    #[test]
    fn test_closing_message_depends_on_booking() {
        let engine = engine();
        let prefix = ["parent", "Asha", "5", "Coding", "Pune", "a@b.com", "9876543210"];

        let mut inputs = prefix.to_vec();
        inputs.push("Yes, book a demo");
        let booked = run(&engine, &inputs);
        assert!(engine.render_content_for(&booked).text.contains("Demo booked"));

        inputs.pop();
        inputs.push("Just call me");
        let not_booked = run(&engine, &inputs);
        assert!(!not_booked.booking_confirmed);
        assert!(engine
            .render_content_for(&not_booked)
            .text
            .contains("within 24 hours"));
    }

    #[test]
    fn test_finalize_lead() {
        let engine = engine();
        let session = run(
            &engine,
            &["parent", "Asha", "5", "Coding", "Pune", "a@b.com", "9876543210"],
        );
        assert!(engine.finalize_lead(&session).is_none());

        let session = engine.advance(&session, "book demo").session;
        let lead = engine.finalize_lead(&session).unwrap();
        assert_eq!(lead.category, VisitorCategory::Parent);
        assert_eq!(lead.name, "Asha");
        assert_eq!(lead.detail(FieldKey::Grade), Some("5"));
        assert_eq!(lead.detail(FieldKey::Phone), None);
        assert_eq!(lead.score, 55);
        assert_eq!(lead.temperature, Temperature::Warm);
        assert!(lead.booking_confirmed);
        assert_eq!(engine.finalize_lead(&session), Some(lead));
    }
}
