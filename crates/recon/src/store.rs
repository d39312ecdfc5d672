//! Seams between the engine and the outside world.
//!
//! The engine never opens a database or a document itself. Callers hand it a
//! [`RequestStore`] and a [`TextExtractor`]; `docrecon-io` provides the real
//! ones, tests provide in-memory fakes.

use std::path::Path;

use crate::error::ReconError;
use crate::format::Amount;
use crate::model::RequestRecord;

/// Read/update/commit primitives over the request table.
///
/// Writes are pending until [`commit`](RequestStore::commit). Rows are never
/// created or deleted through this trait.
pub trait RequestStore {
    /// Every request row, in store order.
    fn load_requests(&mut self) -> Result<Vec<RequestRecord>, ReconError>;

    /// Overwrite `briefSummary`. Returns false if no row has this id.
    fn update_summary(&mut self, id: &str, summary: &str) -> Result<bool, ReconError>;

    /// Overwrite `requestAmount` together with the `formattedAmount` derived
    /// from it. Returns false if no row has this id.
    fn update_amount(&mut self, id: &str, amount: &Amount) -> Result<bool, ReconError>;

    /// Overwrite `documentUrl`. Returns false if no row has this id.
    fn update_document_url(&mut self, id: &str, url: &str) -> Result<bool, ReconError>;

    /// Make every pending write durable.
    fn commit(&mut self) -> Result<(), ReconError>;
}

/// Turns a document on disk into flat text.
pub trait TextExtractor {
    /// Extracted text, or an empty string when the document cannot be read.
    fn extract(&self, path: &Path) -> String;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A `Vec`-backed store with explicit pending/committed state.
///
/// Lets the engine and normalizer be exercised without a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Vec<RequestRecord>,
    pending: Vec<RequestRecord>,
    commits: usize,
}

impl MemoryStore {
    pub fn new(records: Vec<RequestRecord>) -> Self {
        Self {
            committed: records.clone(),
            pending: records,
            commits: 0,
        }
    }

    /// Rows as they would read after a commit.
    pub fn pending(&self) -> &[RequestRecord] {
        &self.pending
    }

    /// Rows as of the last commit.
    pub fn committed(&self) -> &[RequestRecord] {
        &self.committed
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn get(&self, id: &str) -> Option<&RequestRecord> {
        self.committed.iter().find(|r| r.id == id)
    }

    /// Throw away uncommitted writes, as a dropped connection would.
    pub fn rollback(&mut self) {
        self.pending = self.committed.clone();
    }

    fn pending_mut(&mut self, id: &str) -> Option<&mut RequestRecord> {
        self.pending.iter_mut().find(|r| r.id == id)
    }
}

impl RequestStore for MemoryStore {
    fn load_requests(&mut self) -> Result<Vec<RequestRecord>, ReconError> {
        Ok(self.pending.clone())
    }

    fn update_summary(&mut self, id: &str, summary: &str) -> Result<bool, ReconError> {
        Ok(match self.pending_mut(id) {
            Some(record) => {
                record.brief_summary = summary.to_string();
                true
            }
            None => false,
        })
    }

    fn update_amount(&mut self, id: &str, amount: &Amount) -> Result<bool, ReconError> {
        Ok(match self.pending_mut(id) {
            Some(record) => {
                record.request_amount = amount.as_f64();
                record.formatted_amount = amount.formatted();
                true
            }
            None => false,
        })
    }

    fn update_document_url(&mut self, id: &str, url: &str) -> Result<bool, ReconError> {
        Ok(match self.pending_mut(id) {
            Some(record) => {
                record.document_url = Some(url.to_string());
                true
            }
            None => false,
        })
    }

    fn commit(&mut self) -> Result<(), ReconError> {
        self.committed = self.pending.clone();
        self.commits += 1;
        Ok(())
    }
}
