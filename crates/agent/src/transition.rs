//! Step transition function
//!
//! Pure: given the current step, the visitor category, and already-validated
//! input, computes the next step and the session changes to commit. It never
//! sees rejected input.

use serde::Serialize;

use enrollment_agent_core::{CallToAction, FieldKey, Step, VisitorCategory};

use crate::lead_scoring::LeadScorer;

/// Category keywords, checked before the numeric menu choices
const PARENT_KEYWORDS: &[&str] = &["parent", "child", "stem"];
const INSTITUTION_KEYWORDS: &[&str] = &["school", "institution", "partnership"];

const BOOKING_KEYWORDS: &[&str] = &["book", "yes", "1", "demo"];

/// Result of one accepted input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepTransition {
    pub from: Step,
    pub to: Step,
    /// Category after the transition
    pub category: VisitorCategory,
    /// Field written by the step, with the trimmed input
    pub field: Option<(FieldKey, String)>,
    pub score_delta: u32,
    /// Weight of the scored field traversed, if any
    pub max_delta: u32,
    /// Set only when leaving Recommendation
    pub booking_confirmed: Option<bool>,
    pub call_to_action: Option<CallToAction>,
}

impl StepTransition {
    fn stay(step: Step, category: VisitorCategory) -> Self {
        Self {
            from: step,
            to: step,
            category,
            field: None,
            score_delta: 0,
            max_delta: 0,
            booking_confirmed: None,
            call_to_action: None,
        }
    }

    /// True when this transition resolved the visitor category
    pub fn selected_category(&self) -> bool {
        self.from.is_category_select() && self.category.is_known()
    }

    /// True when this transition reached Complete from another step
    pub fn completed(&self) -> bool {
        self.to.is_terminal() && !self.from.is_terminal()
    }
}

/// Classify free text into a visitor category
///
/// Word keywords win over the numeric choices, so "grade 2 parent" is a parent.
/// A keyword must start a word: "parents" matches "parent", "system" does not
/// match "stem".
pub fn classify_category(input: &str) -> VisitorCategory {
    let lower = input.to_lowercase();
    if mentions_any(&lower, PARENT_KEYWORDS) {
        VisitorCategory::Parent
    } else if mentions_any(&lower, INSTITUTION_KEYWORDS) {
        VisitorCategory::Institution
    } else if lower.contains('1') {
        VisitorCategory::Parent
    } else if lower.contains('2') {
        VisitorCategory::Institution
    } else {
        VisitorCategory::Unknown
    }
}

fn mentions_any(lower: &str, keywords: &[&str]) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| keywords.iter().any(|k| word.starts_with(k)))
}

/// Affirmative booking signal at the recommendation step
pub fn is_booking_affirmative(input: &str) -> bool {
    let lower = input.to_lowercase();
    BOOKING_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Compute the transition for validated input
pub fn transition(
    step: Step,
    category: VisitorCategory,
    input: &str,
    scorer: &LeadScorer,
) -> StepTransition {
    let trimmed = input.trim();

    match step {
        Step::Welcome | Step::CategorySelect => {
            let resolved = classify_category(trimmed);
            let to = resolved.first_step().unwrap_or(Step::CategorySelect);
            StepTransition {
                to,
                category: resolved,
                ..StepTransition::stay(step, category)
            }
        }
        Step::ParentName
        | Step::ParentGrade
        | Step::ParentInterest
        | Step::ParentCity
        | Step::ParentEmail
        | Step::ParentPhone
        | Step::InstitutionName
        | Step::InstitutionRole
        | Step::InstitutionStrength
        | Step::InstitutionCurriculum
        | Step::InstitutionProgramFormat
        | Step::InstitutionCity
        | Step::InstitutionEmail
        | Step::InstitutionPhone => {
            let to = step.next_in_path().unwrap_or(Step::Recommendation);
            let field = step.field();
            let signal = field.and_then(|f| scorer.signal(category, f, trimmed));
            StepTransition {
                to,
                field: field.map(|f| (f, trimmed.to_string())),
                score_delta: signal.map(|s| s.points).unwrap_or(0),
                max_delta: signal.map(|s| s.weight).unwrap_or(0),
                ..StepTransition::stay(step, category)
            }
        }
        Step::Recommendation => StepTransition {
            to: Step::Complete,
            booking_confirmed: Some(is_booking_affirmative(trimmed)),
            call_to_action: CallToAction::detect(trimmed, category),
            ..StepTransition::stay(step, category)
        },
        Step::Complete => StepTransition::stay(step, category),
    }
}
