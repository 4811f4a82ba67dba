//! Scripted enrollment conversation
//!
//! Features:
//! - Field validators for every collection step
//! - Step catalog (prompts, suggested replies, progress numbering)
//! - Config-driven additive lead scoring
//! - Pure step transition function
//! - Conversation engine (initialize, advance, render, finalize)
//! - Conversation driver with composing delay, lead persistence, and analytics

pub mod catalog;
pub mod conversation;
pub mod engine;
pub mod lead_scoring;
pub mod transition;
pub mod validation;

pub use catalog::{lookup, lookup_key, StepSpec};
pub use conversation::{ConversationDriver, DriverConfig, TurnOutcome};
pub use engine::{Advance, AdvanceOutcome, Content, ConversationEngine};
pub use lead_scoring::{LeadScore, LeadScorer, SignalScore};
pub use transition::{classify_category, is_booking_affirmative, transition, StepTransition};
pub use validation::{validate, FieldValidator, ValidationRejection};
