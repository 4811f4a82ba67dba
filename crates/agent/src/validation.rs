//! Field validators
//!
//! Each collection step carries at most one validator. Validation is pure and
//! runs before any session change; a rejection carries a visitor-facing message.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use enrollment_agent_core::Step;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\-+()]{10,}$").expect("valid phone regex"));

static INTEGER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("valid integer regex"));

const EMPTY_INPUT_MESSAGE: &str = "Please type a response to continue";

/// Grade bands offered as suggested replies
pub const GRADE_BANDS: &[&str] = &["1-2", "3-5", "6-8", "9-10"];

/// Highest grade accepted as a bare number
const MAX_GRADE: u32 = 12;

pub const INTEREST_TOKENS: &[&str] = &[
    "coding",
    "robotics",
    "math",
    "product designer",
    "ypdp",
    "hots",
    "thinking",
    "full program",
    "not sure",
];

pub const ROLE_TOKENS: &[&str] = &["principal", "coordinator", "management", "teacher", "other"];

pub const CURRICULUM_TOKENS: &[&str] = &[
    "cbse",
    "icse",
    "igcse",
    "ib",
    "state board",
    "integrated",
    "other",
];

pub const PROGRAM_FORMAT_TOKENS: &[&str] = &["after-school", "after school", "integrated", "both"];

/// Why an input was refused at a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRejection {
    pub step: Step,
    pub message: String,
}

impl std::fmt::Display for ValidationRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// Validation rule attached to a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValidator {
    /// At least two characters after trimming
    PersonName,
    City,
    Email,
    Phone,
    /// Grade band or a bare grade number
    Grade,
    /// Numeric free text starting with a positive integer
    StudentCount,
    /// Case-insensitive substring match against a fixed token set
    Choice {
        tokens: &'static [&'static str],
        message: &'static str,
    },
}

impl FieldValidator {
    /// Validator for a step, if the step has one
    pub fn for_step(step: Step) -> Option<FieldValidator> {
        match step {
            Step::ParentName | Step::InstitutionName => Some(FieldValidator::PersonName),
            Step::ParentCity | Step::InstitutionCity => Some(FieldValidator::City),
            Step::ParentEmail | Step::InstitutionEmail => Some(FieldValidator::Email),
            Step::ParentPhone | Step::InstitutionPhone => Some(FieldValidator::Phone),
            Step::ParentGrade => Some(FieldValidator::Grade),
            Step::ParentInterest => Some(FieldValidator::Choice {
                tokens: INTEREST_TOKENS,
                message: "Please pick one of the programs listed, or choose Not Sure",
            }),
            Step::InstitutionRole => Some(FieldValidator::Choice {
                tokens: ROLE_TOKENS,
                message: "Please choose your role from the options",
            }),
            Step::InstitutionStrength => Some(FieldValidator::StudentCount),
            Step::InstitutionCurriculum => Some(FieldValidator::Choice {
                tokens: CURRICULUM_TOKENS,
                message: "Please choose a curriculum from the options",
            }),
            Step::InstitutionProgramFormat => Some(FieldValidator::Choice {
                tokens: PROGRAM_FORMAT_TOKENS,
                message: "Please choose after-school, integrated, or both",
            }),
            Step::Welcome | Step::CategorySelect | Step::Recommendation | Step::Complete => None,
        }
    }

    /// Check raw input, returning the rejection message on failure
    pub fn check(&self, input: &str) -> Result<(), &'static str> {
        let trimmed = input.trim();
        match self {
            FieldValidator::PersonName => {
                if trimmed.chars().count() < 2 {
                    return Err("Please enter your name (at least 2 characters)");
                }
            }
            FieldValidator::City => {
                if trimmed.chars().count() < 2 {
                    return Err("Please enter your city");
                }
            }
            FieldValidator::Email => {
                if !EMAIL_PATTERN.is_match(trimmed) {
                    return Err("Please enter a valid email address");
                }
            }
            FieldValidator::Phone => {
                let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
                if !PHONE_PATTERN.is_match(&compact) {
                    return Err("Please enter a valid phone number");
                }
            }
            FieldValidator::Grade => {
                let normalized = normalize(input);
                let band = GRADE_BANDS.iter().any(|b| normalized.contains(b));
                let bare = first_integer(&normalized)
                    .is_some_and(|grade| (1..=MAX_GRADE).contains(&grade));
                if !band && !bare {
                    return Err("Please choose your child's grade (for example Grades 3-5)");
                }
            }
            FieldValidator::StudentCount => {
                if !leading_integer(input).is_some_and(|n| n >= 1) {
                    return Err("Please enter a valid number of students");
                }
            }
            FieldValidator::Choice { tokens, message } => {
                let normalized = normalize(input);
                if !tokens.iter().any(|t| normalized.contains(t)) {
                    return Err(*message);
                }
            }
        }
        Ok(())
    }
}

/// Validate raw input for a step
///
/// Empty input is refused everywhere except Complete. Steps without a
/// validator accept any non-empty input.
pub fn validate(step: Step, raw: &str) -> Result<(), ValidationRejection> {
    if step.is_terminal() {
        return Ok(());
    }
    if raw.trim().is_empty() {
        return Err(ValidationRejection {
            step,
            message: EMPTY_INPUT_MESSAGE.to_string(),
        });
    }
    match FieldValidator::for_step(step) {
        Some(validator) => validator.check(raw).map_err(|message| ValidationRejection {
            step,
            message: message.to_string(),
        }),
        None => Ok(()),
    }
}

/// Lowercase with en and em dashes folded into hyphens
pub(crate) fn normalize(input: &str) -> String {
    input.to_lowercase().replace(['\u{2013}', '\u{2014}'], "-")
}

/// First run of digits anywhere in the input
pub(crate) fn first_integer(input: &str) -> Option<u32> {
    INTEGER_PATTERN
        .find(input)
        .and_then(|m| m.as_str().parse().ok())
}

/// Integer at the start of the input once commas are stripped
pub(crate) fn leading_integer(input: &str) -> Option<u64> {
    let stripped = input.replace(',', "");
    let digits: String = stripped
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
