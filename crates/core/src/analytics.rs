//! Analytics events emitted at fixed points of a conversation
//!
//! Events are fire-and-forget: a named event plus a flat key/value payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::lead::CallToAction;

/// Named analytics event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventKind {
    ConversationStarted,
    /// Visitor category resolved
    UserTypeSelected,
    DemoClicked,
    CounselorClicked,
    BrochureDownloaded,
    PartnershipCallClicked,
    ProposalDeckClicked,
    LeadCompleted,
}

impl AnalyticsEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConversationStarted => "conversation_started",
            Self::UserTypeSelected => "user_type_selected",
            Self::DemoClicked => "demo_clicked",
            Self::CounselorClicked => "counselor_clicked",
            Self::BrochureDownloaded => "brochure_downloaded",
            Self::PartnershipCallClicked => "partnership_call_clicked",
            Self::ProposalDeckClicked => "proposal_deck_clicked",
            Self::LeadCompleted => "lead_completed",
        }
    }

    /// Click event for a call-to-action
    pub fn for_call_to_action(cta: CallToAction) -> Self {
        match cta {
            CallToAction::BookDemo => Self::DemoClicked,
            CallToAction::TalkToCounselor => Self::CounselorClicked,
            CallToAction::DownloadBrochure => Self::BrochureDownloaded,
            CallToAction::PartnershipCall => Self::PartnershipCallClicked,
            CallToAction::ProposalDeck => Self::ProposalDeckClicked,
        }
    }
}

/// One analytics event with its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event: AnalyticsEventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payload: BTreeMap<String, String>,
}

impl AnalyticsEvent {
    pub fn new(event: AnalyticsEventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            event,
            timestamp,
            payload: BTreeMap::new(),
        }
    }

    /// Builder-style payload entry
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.payload.insert(key.to_string(), value.to_string());
        self
    }
}
