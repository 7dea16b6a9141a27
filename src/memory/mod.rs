//! Read-only access to conversation memory.
//!
//! Sub-modules:
//! - `types`: the `MemoryRecord` shared by every backend.
//! - `mongo`: MongoDB-backed store populated by the ingestion service.
//!
//! Memory is strictly best-effort. [`MemoryStore::fetch_recent`] never
//! fails: a store that cannot be reached yields an empty list and a
//! warning, and the conversation turn carries on without context.

pub mod mongo;
pub mod types;

pub use mongo::MongoMemoryStore;
pub use types::{INLINE_CONTENT_LIMIT, MemoryRecord};

use crate::error::{AssistantError, Result};
use tracing::{debug, warn};

/// Number of records pulled into a conversation turn.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// A source of remembered conversations.
pub trait MemoryStore: Send + Sync {
    /// Fetch up to `limit` of the most recent records, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::MemoryUnavailable`] when the store cannot
    /// be reached or queried.
    fn try_fetch_recent(&self, limit: usize) -> Result<Vec<MemoryRecord>>;

    /// Fail-soft variant of [`try_fetch_recent`](Self::try_fetch_recent).
    fn fetch_recent(&self, limit: usize) -> Vec<MemoryRecord> {
        match self.try_fetch_recent(limit) {
            Ok(records) => {
                debug!(count = records.len(), "loaded memory records");
                records
            }
            Err(e) => {
                warn!("memory context loading failed: {e}");
                Vec::new()
            }
        }
    }
}

/// Store used when no memory backend is configured.
#[derive(Debug, Clone)]
pub struct DisabledMemoryStore {
    reason: String,
}

impl DisabledMemoryStore {
    /// Create a store that always reports `reason` as unavailable.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl MemoryStore for DisabledMemoryStore {
    fn try_fetch_recent(&self, _limit: usize) -> Result<Vec<MemoryRecord>> {
        Err(AssistantError::MemoryUnavailable(self.reason.clone()))
    }
}
