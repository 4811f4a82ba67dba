//! Step catalog
//!
//! Fixed table from each step to its prompt, suggested replies, validator,
//! and progress numbering. Recommendation and Complete carry generic texts
//! here; the engine renders their personalised variants from the session.

use enrollment_agent_core::Step;

use crate::validation::FieldValidator;

const NO_REPLIES: &[&str] = &[];

const CATEGORY_REPLIES: &[&str] = &["1. A Parent", "2. A School Representative"];

const GRADE_REPLIES: &[&str] = &[
    "Grades 1\u{2013}2",
    "Grades 3\u{2013}5",
    "Grades 6\u{2013}8",
    "Grades 9\u{2013}10",
];

const INTEREST_REPLIES: &[&str] = &[
    "Robotics & Coding Program",
    "Young Product Designer Program (YPDP)",
    "Higher Order Thinking Skills (HOTS)",
    "Not Sure",
];

const ROLE_REPLIES: &[&str] = &["Principal", "Coordinator", "Management", "Teacher", "Other"];

const CURRICULUM_REPLIES: &[&str] = &["CBSE", "ICSE", "IGCSE", "IB", "State Board", "Other"];

const PROGRAM_FORMAT_REPLIES: &[&str] = &["After-school program", "Integrated curriculum", "Both"];

/// Catalog entry for one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpec {
    pub step: Step,
    pub prompt: &'static str,
    pub suggested_replies: &'static [&'static str],
    pub validator: Option<FieldValidator>,
    /// 1-based position in the collection path; 0 outside it
    pub step_number: u8,
    /// Collection path length; 0 outside it
    pub total_steps: u8,
}

impl StepSpec {
    pub fn suggested_replies(&self) -> Vec<String> {
        self.suggested_replies.iter().map(|r| r.to_string()).collect()
    }
}

/// Catalog entry for a step
pub fn lookup(step: Step) -> StepSpec {
    let (prompt, suggested_replies): (&'static str, &'static [&'static str]) = match step {
        Step::Welcome => (
            "Hi \u{1F44B} Welcome to WizKlub!\nAre you:\n1. A Parent\n2. A School Representative",
            CATEGORY_REPLIES,
        ),
        Step::CategorySelect => (
            "Sorry, I didn't catch that. Are you:\n1. A Parent\n2. A School Representative",
            CATEGORY_REPLIES,
        ),
        Step::ParentName => (
            "Great! I'd love to help you find the perfect program for your child. What's your full name?",
            NO_REPLIES,
        ),
        Step::ParentGrade => (
            "That's wonderful \u{1F60A} Which grade is your child currently studying in?",
            GRADE_REPLIES,
        ),
        Step::ParentInterest => (
            "Wonderful! Which program are you most interested in for your child?",
            INTEREST_REPLIES,
        ),
        Step::ParentCity => ("Which city are you located in?", NO_REPLIES),
        Step::ParentEmail => ("Great! What's your email address?", NO_REPLIES),
        Step::ParentPhone => ("And your phone number?", NO_REPLIES),
        Step::InstitutionName => (
            "Excellent! I can help you explore partnership opportunities. What's your full name?",
            NO_REPLIES,
        ),
        Step::InstitutionRole => (
            "What's your role at the school?",
            ROLE_REPLIES,
        ),
        Step::InstitutionStrength => (
            "How many students are in your school? (e.g., 500, 1000)",
            NO_REPLIES,
        ),
        Step::InstitutionCurriculum => (
            "Which curriculum does your school follow?",
            CURRICULUM_REPLIES,
        ),
        Step::InstitutionProgramFormat => (
            "Are you looking for an after-school program or an integrated curriculum?",
            PROGRAM_FORMAT_REPLIES,
        ),
        Step::InstitutionCity => ("Which city is your school located in?", NO_REPLIES),
        Step::InstitutionEmail => ("What's your email address?", NO_REPLIES),
        Step::InstitutionPhone => ("And your phone number?", NO_REPLIES),
        Step::Recommendation => ("What would you like to do next?", NO_REPLIES),
        Step::Complete => ("Thank you! Our team will reach out to you shortly.", NO_REPLIES),
    };

    let (step_number, total_steps) = step.progress().unwrap_or((0, 0));

    StepSpec {
        step,
        prompt,
        suggested_replies,
        validator: FieldValidator::for_step(step),
        step_number,
        total_steps,
    }
}

/// Catalog entry by serialized key; unknown keys resolve to Welcome
pub fn lookup_key(key: &str) -> StepSpec {
    lookup(Step::parse_lenient(key))
}
