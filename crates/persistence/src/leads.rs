//! Lead stores
//!
//! Completed leads are append-only. The JSON file store keeps a single array
//! document on disk and rewrites it on every append.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use enrollment_agent_core::{LeadRecord, LeadStore, Result};

use crate::PersistenceError;

/// Process-local lead list
#[derive(Debug, Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<Vec<LeadRecord>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.leads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.read().is_empty()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn append(&self, record: &LeadRecord) -> Result<()> {
        self.leads.write().push(record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<LeadRecord>> {
        Ok(self.leads.read().clone())
    }
}

/// Leads kept as a JSON array in a single file
#[derive(Debug)]
pub struct JsonFileLeadStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl JsonFileLeadStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or empty file reads as no leads
    async fn read_all(&self) -> std::result::Result<Vec<LeadRecord>, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| PersistenceError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn write_all(&self, leads: &[LeadRecord]) -> std::result::Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(leads)?;

        // write beside the target, then swap in
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LeadStore for JsonFileLeadStore {
    async fn append(&self, record: &LeadRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut leads = self.read_all().await?;
        leads.push(record.clone());
        self.write_all(&leads).await?;
        tracing::debug!(path = %self.path.display(), total = leads.len(), "Lead appended");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<LeadRecord>> {
        let _guard = self.write_lock.lock().await;
        Ok(self.read_all().await?)
    }
}
