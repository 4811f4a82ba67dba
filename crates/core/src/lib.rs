//! Core types and collaborator traits for the enrollment assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation steps, visitor categories, and the session value
//! - Lead records, temperatures, and calls-to-action
//! - Analytics events
//! - Collaborator traits (lead storage, analytics, clock)
//! - Error types

pub mod analytics;
pub mod conversation;
pub mod error;
pub mod lead;
pub mod traits;

pub use analytics::{AnalyticsEvent, AnalyticsEventKind};
pub use conversation::{
    FieldKey, Fields, Message, MessageRole, Session, Step, VisitorCategory, INSTITUTION_PATH,
    PARENT_PATH,
};
pub use error::{Error, Result};
pub use lead::{CallToAction, LeadRecord, Temperature};
pub use traits::{AnalyticsSink, Clock, FixedClock, LeadStore, NoopAnalytics, SystemClock};
