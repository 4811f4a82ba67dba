//! Lead storage trait

use async_trait::async_trait;

use crate::error::Result;
use crate::lead::LeadRecord;

/// Append-only store of completed leads
///
/// Storage is best-effort: callers log failures and carry on.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Append a finalized lead
    async fn append(&self, record: &LeadRecord) -> Result<()>;

    /// All stored leads, oldest first
    async fn list(&self) -> Result<Vec<LeadRecord>>;
}
