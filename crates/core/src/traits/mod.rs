//! Collaborator traits injected into the conversation driver
//!
//! ```text
//! LeadStore:     append / list completed leads
//! AnalyticsSink: fire-and-forget event tracking
//! Clock:         timestamps for sessions and leads
//! ```

mod analytics;
mod clock;
mod lead_store;

pub use analytics::{AnalyticsSink, NoopAnalytics};
pub use clock::{Clock, FixedClock, SystemClock};
pub use lead_store::LeadStore;
