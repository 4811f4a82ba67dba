//! Finalized lead record handed to the persistence collaborator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{FieldKey, Fields, VisitorCategory};

/// Coarse triage label derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Temperature {
    Hot,
    Warm,
    Cold,
}

impl Temperature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Temperature::Hot => "HOT",
            Temperature::Warm => "WARM",
            Temperature::Cold => "COLD",
        }
    }
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closing call-to-action chosen by the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallToAction {
    BookDemo,
    TalkToCounselor,
    DownloadBrochure,
    PartnershipCall,
    ProposalDeck,
}

impl CallToAction {
    pub const ALL: [CallToAction; 5] = [
        CallToAction::BookDemo,
        CallToAction::TalkToCounselor,
        CallToAction::DownloadBrochure,
        CallToAction::PartnershipCall,
        CallToAction::ProposalDeck,
    ];

    /// Actions offered to each category, in matching priority order
    pub fn available_for(category: VisitorCategory) -> &'static [CallToAction] {
        match category {
            VisitorCategory::Parent => &[
                CallToAction::BookDemo,
                CallToAction::TalkToCounselor,
                CallToAction::DownloadBrochure,
            ],
            VisitorCategory::Institution => &[
                CallToAction::BookDemo,
                CallToAction::PartnershipCall,
                CallToAction::ProposalDeck,
            ],
            VisitorCategory::Unknown => &[],
        }
    }

    /// Keywords that identify this action in free text
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            CallToAction::BookDemo => &["demo"],
            CallToAction::TalkToCounselor => &["counselor", "counsellor", "call"],
            CallToAction::DownloadBrochure => &["brochure"],
            CallToAction::PartnershipCall => &["partnership", "call"],
            CallToAction::ProposalDeck => &["proposal", "deck"],
        }
    }

    /// Classify free-text input against the actions offered to `category`
    pub fn detect(input: &str, category: VisitorCategory) -> Option<CallToAction> {
        let lower = input.to_lowercase();
        CallToAction::available_for(category)
            .iter()
            .copied()
            .find(|cta| cta.keywords().iter().any(|k| lower.contains(k)))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallToAction::BookDemo => "book_demo",
            CallToAction::TalkToCounselor => "talk_to_counselor",
            CallToAction::DownloadBrochure => "download_brochure",
            CallToAction::PartnershipCall => "partnership_call",
            CallToAction::ProposalDeck => "proposal_deck",
        }
    }
}

/// Immutable snapshot of a completed conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub category: VisitorCategory,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    /// Category-specific answers (grade, interest / role, strength, curriculum, format)
    pub details: Fields,
    pub score: u32,
    pub score_max: u32,
    pub temperature: Temperature,
    pub booking_confirmed: bool,
    pub call_to_action: Option<CallToAction>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl LeadRecord {
    pub fn detail(&self, key: FieldKey) -> Option<&str> {
        self.details.get(&key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_parent_call_to_action() {
        let parent = VisitorCategory::Parent;
        assert_eq!(
            CallToAction::detect("Book FREE Live Demo", parent),
            Some(CallToAction::BookDemo)
        );
        assert_eq!(
            CallToAction::detect("Talk to Academic Counselor", parent),
            Some(CallToAction::TalkToCounselor)
        );
        assert_eq!(
            CallToAction::detect("Just call me", parent),
            Some(CallToAction::TalkToCounselor)
        );
        assert_eq!(
            CallToAction::detect("Download Brochure", parent),
            Some(CallToAction::DownloadBrochure)
        );
        assert_eq!(CallToAction::detect("maybe later", parent), None);
    }

    #[test]
    fn test_detect_institution_call_to_action() {
        let school = VisitorCategory::Institution;
        assert_eq!(
            CallToAction::detect("Schedule Partnership Call", school),
            Some(CallToAction::PartnershipCall)
        );
        assert_eq!(
            CallToAction::detect("Get Proposal Deck", school),
            Some(CallToAction::ProposalDeck)
        );
        assert_eq!(
            CallToAction::detect("Yes, book partnership demo", school),
            Some(CallToAction::BookDemo)
        );
        assert_eq!(CallToAction::detect("Download Brochure", school), None);
    }

    #[test]
    fn test_temperature_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Temperature::Hot).unwrap(), "\"HOT\"");
        assert_eq!(Temperature::Warm.to_string(), "WARM");
    }
}
