//! Conversation types: steps, visitor categories, collected fields, and the session value
//!
//! A [`Session`] is a plain value. The engine never mutates one in place; each
//! accepted input produces a fresh session, which keeps replay and testing trivial.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::lead::CallToAction;

/// Two-way visitor classification selecting the collection path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisitorCategory {
    /// Not yet classified (only valid at Welcome / CategorySelect)
    #[default]
    Unknown,
    /// Individual guardian looking for a program for their child
    Parent,
    /// School or institution representative exploring a partnership
    Institution,
}

impl VisitorCategory {
    /// Display name used in analytics payloads and lead exports
    pub fn display_name(&self) -> &'static str {
        match self {
            VisitorCategory::Unknown => "Unknown",
            VisitorCategory::Parent => "Parent",
            VisitorCategory::Institution => "School",
        }
    }

    /// First collection step of this category's path
    pub fn first_step(&self) -> Option<Step> {
        match self {
            VisitorCategory::Unknown => None,
            VisitorCategory::Parent => Some(Step::ParentName),
            VisitorCategory::Institution => Some(Step::InstitutionName),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, VisitorCategory::Unknown)
    }
}

/// Name of a collected field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Name,
    Grade,
    Interest,
    Role,
    Strength,
    Curriculum,
    ProgramFormat,
    City,
    Email,
    Phone,
}

impl FieldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Name => "name",
            FieldKey::Grade => "grade",
            FieldKey::Interest => "interest",
            FieldKey::Role => "role",
            FieldKey::Strength => "strength",
            FieldKey::Curriculum => "curriculum",
            FieldKey::ProgramFormat => "program_format",
            FieldKey::City => "city",
            FieldKey::Email => "email",
            FieldKey::Phone => "phone",
        }
    }

    /// Contact fields are shared by both paths; the rest are category specific
    pub fn is_contact(&self) -> bool {
        matches!(
            self,
            FieldKey::Name | FieldKey::City | FieldKey::Email | FieldKey::Phone
        )
    }
}

/// Collected fields, ordered by key so serialized sessions and leads are deterministic
pub type Fields = BTreeMap<FieldKey, String>;

/// A discrete point in the scripted conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Opening greeting; classifies the visitor
    #[default]
    Welcome,
    /// Retry state for an unclassified visitor (same logic as Welcome)
    CategorySelect,
    ParentName,
    ParentGrade,
    ParentInterest,
    ParentCity,
    ParentEmail,
    ParentPhone,
    InstitutionName,
    InstitutionRole,
    InstitutionStrength,
    InstitutionCurriculum,
    InstitutionProgramFormat,
    InstitutionCity,
    InstitutionEmail,
    InstitutionPhone,
    /// Shared closing recommendation with call-to-action replies
    Recommendation,
    /// Terminal, absorbing step
    Complete,
}

/// Parent collection path in order
pub const PARENT_PATH: &[Step] = &[
    Step::ParentName,
    Step::ParentGrade,
    Step::ParentInterest,
    Step::ParentCity,
    Step::ParentEmail,
    Step::ParentPhone,
];

/// Institution collection path in order
pub const INSTITUTION_PATH: &[Step] = &[
    Step::InstitutionName,
    Step::InstitutionRole,
    Step::InstitutionStrength,
    Step::InstitutionCurriculum,
    Step::InstitutionProgramFormat,
    Step::InstitutionCity,
    Step::InstitutionEmail,
    Step::InstitutionPhone,
];

impl Step {
    /// All steps, in declaration order
    pub const ALL: [Step; 18] = [
        Step::Welcome,
        Step::CategorySelect,
        Step::ParentName,
        Step::ParentGrade,
        Step::ParentInterest,
        Step::ParentCity,
        Step::ParentEmail,
        Step::ParentPhone,
        Step::InstitutionName,
        Step::InstitutionRole,
        Step::InstitutionStrength,
        Step::InstitutionCurriculum,
        Step::InstitutionProgramFormat,
        Step::InstitutionCity,
        Step::InstitutionEmail,
        Step::InstitutionPhone,
        Step::Recommendation,
        Step::Complete,
    ];

    /// Stable key used in serialized sessions
    pub fn as_key(&self) -> &'static str {
        match self {
            Step::Welcome => "welcome",
            Step::CategorySelect => "category_select",
            Step::ParentName => "parent_name",
            Step::ParentGrade => "parent_grade",
            Step::ParentInterest => "parent_interest",
            Step::ParentCity => "parent_city",
            Step::ParentEmail => "parent_email",
            Step::ParentPhone => "parent_phone",
            Step::InstitutionName => "institution_name",
            Step::InstitutionRole => "institution_role",
            Step::InstitutionStrength => "institution_strength",
            Step::InstitutionCurriculum => "institution_curriculum",
            Step::InstitutionProgramFormat => "institution_program_format",
            Step::InstitutionCity => "institution_city",
            Step::InstitutionEmail => "institution_email",
            Step::InstitutionPhone => "institution_phone",
            Step::Recommendation => "recommendation",
            Step::Complete => "complete",
        }
    }

    /// Strict parse of a step key
    pub fn from_key(key: &str) -> Option<Step> {
        Step::ALL.iter().copied().find(|step| step.as_key() == key)
    }

    /// Lenient parse: unknown keys fall back to Welcome
    ///
    /// An unknown key means the stored session is stale or corrupted, so it is
    /// logged but never surfaced to the visitor.
    pub fn parse_lenient(key: &str) -> Step {
        Step::from_key(key).unwrap_or_else(|| {
            tracing::warn!(step = %key, "Unknown step key, falling back to welcome");
            Step::Welcome
        })
    }

    /// Welcome and CategorySelect share identical transition logic
    pub fn is_category_select(&self) -> bool {
        matches!(self, Step::Welcome | Step::CategorySelect)
    }

    /// Which category path this step belongs to, if any
    pub fn category(&self) -> Option<VisitorCategory> {
        if PARENT_PATH.contains(self) {
            Some(VisitorCategory::Parent)
        } else if INSTITUTION_PATH.contains(self) {
            Some(VisitorCategory::Institution)
        } else {
            None
        }
    }

    pub fn is_collection(&self) -> bool {
        self.category().is_some()
    }

    /// Field written by this step, for collection steps
    pub fn field(&self) -> Option<FieldKey> {
        match self {
            Step::ParentName | Step::InstitutionName => Some(FieldKey::Name),
            Step::ParentGrade => Some(FieldKey::Grade),
            Step::ParentInterest => Some(FieldKey::Interest),
            Step::InstitutionRole => Some(FieldKey::Role),
            Step::InstitutionStrength => Some(FieldKey::Strength),
            Step::InstitutionCurriculum => Some(FieldKey::Curriculum),
            Step::InstitutionProgramFormat => Some(FieldKey::ProgramFormat),
            Step::ParentCity | Step::InstitutionCity => Some(FieldKey::City),
            Step::ParentEmail | Step::InstitutionEmail => Some(FieldKey::Email),
            Step::ParentPhone | Step::InstitutionPhone => Some(FieldKey::Phone),
            Step::Welcome | Step::CategorySelect | Step::Recommendation | Step::Complete => None,
        }
    }

    /// Next step in the fixed linear order of a collection path
    ///
    /// The last collection step of either path leads to Recommendation.
    pub fn next_in_path(&self) -> Option<Step> {
        let path = match self.category()? {
            VisitorCategory::Parent => PARENT_PATH,
            VisitorCategory::Institution => INSTITUTION_PATH,
            VisitorCategory::Unknown => return None,
        };
        let index = path.iter().position(|s| s == self)?;
        Some(path.get(index + 1).copied().unwrap_or(Step::Recommendation))
    }

    /// 1-based position within the collection path plus the path length
    pub fn progress(&self) -> Option<(u8, u8)> {
        let path = match self.category()? {
            VisitorCategory::Parent => PARENT_PATH,
            VisitorCategory::Institution => INSTITUTION_PATH,
            VisitorCategory::Unknown => return None,
        };
        let index = path.iter().position(|s| s == self)?;
        Some((index as u8 + 1, path.len() as u8))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Complete)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Step::parse_lenient(&key))
    }
}

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    Visitor,
    Assistant,
}

/// One entry in the message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_replies: Vec<String>,
}

impl Message {
    pub fn visitor(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Visitor,
            text: text.into(),
            suggested_replies: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>, suggested_replies: Vec<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
            suggested_replies,
        }
    }
}

/// State of one conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub current_step: Step,
    #[serde(default)]
    pub visitor_category: VisitorCategory,
    #[serde(default)]
    pub fields: Fields,
    /// Accumulated score from the scored steps completed so far
    #[serde(default)]
    pub score: u32,
    /// Sum of the weights of every scored step traversed so far
    #[serde(default)]
    pub score_max: u32,
    /// Affirmative booking signal captured at the recommendation step
    #[serde(default)]
    pub booking_confirmed: bool,
    #[serde(default)]
    pub call_to_action: Option<CallToAction>,
    #[serde(default)]
    pub message_log: Vec<Message>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Fresh session at Welcome with empty fields and zero score
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            current_step: Step::Welcome,
            visitor_category: VisitorCategory::Unknown,
            fields: Fields::new(),
            score: 0,
            score_max: 0,
            booking_confirmed: false,
            call_to_action: None,
            message_log: Vec::new(),
            started_at,
            completed_at: None,
        }
    }

    pub fn field(&self, key: FieldKey) -> Option<&str> {
        self.fields.get(&key).map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.current_step.is_terminal()
    }

    /// Check the step/category invariants
    ///
    /// The category is Unknown exactly while classifying, and collection steps
    /// must belong to the classified category's path.
    pub fn is_consistent(&self) -> bool {
        if self.current_step.is_category_select() {
            return !self.visitor_category.is_known();
        }
        if !self.visitor_category.is_known() {
            return false;
        }
        match self.current_step.category() {
            Some(path) => path == self.visitor_category,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_keys_roundtrip() {
        for step in Step::ALL {
            assert_eq!(Step::from_key(step.as_key()), Some(step));
        }
        assert_eq!(Step::from_key("success"), None);
    }

    #[test]
    fn test_lenient_parse_falls_back_to_welcome() {
        assert_eq!(Step::parse_lenient("parent_email"), Step::ParentEmail);
        assert_eq!(Step::parse_lenient("school_recommendation"), Step::Welcome);
    }

    #[test]
    fn test_paths_end_at_recommendation() {
        assert_eq!(Step::ParentPhone.next_in_path(), Some(Step::Recommendation));
        assert_eq!(Step::InstitutionPhone.next_in_path(), Some(Step::Recommendation));
        assert_eq!(Step::ParentName.next_in_path(), Some(Step::ParentGrade));
        assert_eq!(Step::Recommendation.next_in_path(), None);
    }

    #[test]
    fn test_progress_numbers() {
        assert_eq!(Step::ParentName.progress(), Some((1, 6)));
        assert_eq!(Step::ParentPhone.progress(), Some((6, 6)));
        assert_eq!(Step::InstitutionPhone.progress(), Some((8, 8)));
        assert_eq!(Step::Welcome.progress(), None);
        assert_eq!(Step::Complete.progress(), None);
    }

    #[test]
    fn test_every_collection_step_has_a_field() {
        for step in PARENT_PATH.iter().chain(INSTITUTION_PATH) {
            assert!(step.field().is_some(), "{step} has no field");
        }
    }

    #[test]
    fn test_session_consistency() {
        let mut session = Session::new(Utc::now());
        assert!(session.is_consistent());

        session.current_step = Step::ParentEmail;
        assert!(!session.is_consistent());

        session.visitor_category = VisitorCategory::Parent;
        assert!(session.is_consistent());

        session.visitor_category = VisitorCategory::Institution;
        assert!(!session.is_consistent());
    }

    #[test]
    fn test_stale_session_deserializes_at_welcome() {
        let json = r#"{"current_step":"school_recommendation","started_at":"2024-01-01T00:00:00Z"}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.current_step, Step::Welcome);
        assert!(session.fields.is_empty());
    }
}
