//! End-to-end conversation flows through the engine and the driver

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use enrollment_agent_agent::{
    AdvanceOutcome, ConversationDriver, ConversationEngine, DriverConfig, TurnOutcome,
};
use enrollment_agent_config::ScoringConfig;
use enrollment_agent_core::{
    AnalyticsEvent, AnalyticsSink, FieldKey, FixedClock, LeadRecord, LeadStore, NoopAnalytics,
    Result, Session, Step, Temperature, VisitorCategory,
};

const SCENARIO_A: &[&str] = &[
    "parent",
    "Asha Kulkarni",
    "5",
    "Coding",
    "Pune",
    "a@b.com",
    "9876543210",
    "book demo",
];

const SCENARIO_B: &[&str] = &[
    "school",
    "Ravi Shankar",
    "Teacher",
    "50",
    "CBSE",
    "After-school program",
    "Mysuru",
    "ravi@school.org",
    "9876543210",
    "Get Proposal Deck",
];

#[derive(Default)]
struct MemoryStore {
    leads: Mutex<Vec<LeadRecord>>,
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn append(&self, record: &LeadRecord) -> Result<()> {
        self.leads.lock().push(record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<LeadRecord>> {
        Ok(self.leads.lock().clone())
    }
}

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl AnalyticsSink for EventLog {
    fn track(&self, event: AnalyticsEvent) {
        self.events.lock().push(event);
    }
}

fn fixed_engine() -> ConversationEngine {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap());
    ConversationEngine::new(ScoringConfig::default(), Arc::new(clock))
}

fn replay(engine: &ConversationEngine, inputs: &[&str]) -> Session {
    let mut session = engine.initialize_session();
    for input in inputs {
        let advance = engine.advance(&session, input);
        assert!(
            matches!(advance.outcome, AdvanceOutcome::Transitioned(_)),
            "{input:?} rejected at {}",
            session.current_step
        );
        session = advance.session;
    }
    session
}

#[test]
fn test_scenario_a_parent_lead() {
    let engine = fixed_engine();
    let before_booking = replay(&engine, &SCENARIO_A[..SCENARIO_A.len() - 1]);
    assert_eq!(before_booking.current_step, Step::Recommendation);

    let session = replay(&engine, SCENARIO_A);
    assert_eq!(session.current_step, Step::Complete);
    assert_eq!(session.visitor_category, VisitorCategory::Parent);
    assert!(session.booking_confirmed);

    let lead = engine.finalize_lead(&session).expect("completed session has a lead");
    assert!(lead.score >= 55);
    assert_eq!(lead.score, 55);
    assert_eq!(lead.temperature, Temperature::Warm);
    assert_eq!(lead.city, "Pune");
    assert_eq!(lead.detail(FieldKey::Interest), Some("Coding"));
}

#[test]
fn test_scenario_b_institution_cold_lead() {
    let engine = fixed_engine();
    let session = replay(&engine, SCENARIO_B);
    assert_eq!(session.current_step, Step::Complete);
    assert_eq!(session.visitor_category, VisitorCategory::Institution);
    assert!(!session.booking_confirmed);

    let lead = engine.finalize_lead(&session).unwrap();
    assert_eq!(lead.score, 0);
    assert_eq!(lead.temperature, Temperature::Cold);
    assert_eq!(lead.detail(FieldKey::Curriculum), Some("CBSE"));
    assert_eq!(lead.detail(FieldKey::Strength), Some("50"));
}

#[test]
fn test_scenario_c_unclassified_visitor() {
    let engine = fixed_engine();
    let session = replay(&engine, &["hello"]);
    assert_eq!(session.current_step, Step::CategorySelect);
    assert_eq!(session.visitor_category, VisitorCategory::Unknown);

    let session = replay(&engine, &["hello", "what is this?", "2"]);
    assert_eq!(session.current_step, Step::InstitutionName);
}

#[test]
fn test_hot_institution_lead() {
    let engine = fixed_engine();
    let session = replay(
        &engine,
        &[
            "2",
            "Meera Iyer",
            "Principal",
            "1,500",
            "ICSE",
            "Integrated curriculum",
            "Bengaluru",
            "meera@school.in",
            "080 4123 4567",
            "Schedule Partnership Call",
        ],
    );
    let lead = engine.finalize_lead(&session).unwrap();
    assert_eq!(lead.score, 75);
    assert_eq!(lead.score_max, 75);
    assert_eq!(lead.temperature, Temperature::Hot);
}

#[test]
fn test_finalize_is_idempotent() {
    let engine = fixed_engine();
    let session = replay(&engine, SCENARIO_A);
    assert_eq!(engine.finalize_lead(&session), engine.finalize_lead(&session));
}

#[test]
fn test_replay_with_fixed_clock_is_byte_identical() {
    let first = fixed_engine();
    let second = fixed_engine();
    let a = first.finalize_lead(&replay(&first, SCENARIO_B)).unwrap();
    let b = second.finalize_lead(&replay(&second, SCENARIO_B)).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_rejections_never_change_the_session() {
    let engine = fixed_engine();
    let at_email = replay(&engine, &SCENARIO_A[..5]);
    assert_eq!(at_email.current_step, Step::ParentEmail);

    for bad in ["", "   ", "not-an-email", "a@b"] {
        let advance = engine.advance(&at_email, bad);
        assert_eq!(advance.session.current_step, at_email.current_step);
        assert_eq!(advance.session.fields, at_email.fields);
        assert_eq!(advance.session.score, at_email.score);
        match advance.outcome {
            AdvanceOutcome::Rejected(rejection) => assert!(!rejection.message.is_empty()),
            other => panic!("{bad:?} accepted: {other:?}"),
        }
    }

    let at_phone = engine.advance(&at_email, "a@b.co").session;
    assert!(engine.advance(&at_phone, "12345").is_rejected());
    assert!(!engine.advance(&at_phone, "9876543210").is_rejected());
}

#[test]
fn test_score_never_decreases() {
    let engine = fixed_engine();
    let mut session = engine.initialize_session();
    for input in SCENARIO_A {
        let next = engine.advance(&session, input).session;
        assert!(next.score >= session.score);
        assert!(next.score <= engine.scorer().config().parent_max());
        session = next;
    }
}

#[test]
fn test_institution_score_never_exceeds_ceiling() {
    let engine = fixed_engine();
    let ceiling = engine.scorer().config().institution_max();
    let mut session = engine.initialize_session();
    for input in [
        "institution",
        "Meera Iyer",
        "Principal",
        "1,500",
        "ICSE",
        "Integrated curriculum",
        "Bengaluru",
        "meera@school.in",
        "9876543210",
        "Schedule Partnership Call",
    ] {
        let next = engine.advance(&session, input).session;
        assert!(next.score >= session.score, "score dropped at {input:?}");
        assert!(next.score <= next.score_max);
        assert!(next.score <= ceiling);
        session = next;
    }
    assert!(session.is_complete());
    assert_eq!(session.score, ceiling);
}

#[tokio::test]
async fn test_driver_runs_scenario_a_end_to_end() {
    let store = Arc::new(MemoryStore::default());
    let events = Arc::new(EventLog::default());
    let mut driver = ConversationDriver::new(
        Arc::new(fixed_engine()),
        store.clone(),
        events.clone(),
        DriverConfig {
            reply_delay: Duration::from_millis(50),
        },
    );

    for input in SCENARIO_A {
        let outcome = driver.submit(input).await;
        assert!(matches!(outcome, TurnOutcome::Accepted { .. }), "{input:?}: {outcome:?}");
        assert_eq!(driver.submit("too fast").await, TurnOutcome::Ignored);
        assert!(driver.await_reply().await.is_some());
    }

    let stored = store.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(Some(&stored[0]), driver.lead());

    // greeting plus one visitor and one assistant message per input
    assert_eq!(driver.session().message_log.len(), 1 + 2 * SCENARIO_A.len());

    let names: Vec<&str> = events.events.lock().iter().map(|e| e.event.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "conversation_started",
            "user_type_selected",
            "demo_clicked",
            "lead_completed"
        ]
    );
}

#[tokio::test]
async fn test_driver_without_analytics() {
    let mut driver = ConversationDriver::new(
        Arc::new(fixed_engine()),
        Arc::new(MemoryStore::default()),
        Arc::new(NoopAnalytics),
        DriverConfig {
            reply_delay: Duration::ZERO,
        },
    );
    for input in SCENARIO_B {
        driver.submit(input).await;
        driver.take_reply();
    }
    assert!(driver.session().is_complete());
    assert_eq!(driver.lead().map(|l| l.temperature), Some(Temperature::Cold));
}
