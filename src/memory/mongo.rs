//! MongoDB-backed memory store.
//!
//! The ingestion service inserts one document per remembered conversation
//! with `title`, `overview`, `content` and a `local_time` ISO timestamp.
//! Turns read the newest `limit` documents, projected to the three text
//! fields plus the timestamp, and returned oldest first. `clear` empties the collection.

use super::MemoryStore;
use super::types::MemoryRecord;
use crate::config::MemoryConfig;
use crate::error::{AssistantError, Result};
use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use mongodb::sync::{Client, Collection};
use std::time::Duration;
use tracing::info;

/// Field the ingestion service stamps with local insertion time.
const ORDER_FIELD: &str = "local_time";

/// Memory store reading from a MongoDB collection.
pub struct MongoMemoryStore {
    collection: Collection<Document>,
}

impl MongoMemoryStore {
    /// Build a client for the configured deployment.
    ///
    /// The driver connects lazily, so this only validates the URI; an
    /// unreachable server surfaces later from `try_fetch_recent`.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::MemoryUnavailable`] when no URI is set or
    /// the URI cannot be parsed.
    pub fn connect(config: &MemoryConfig) -> Result<Self> {
        let uri = config
            .uri
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AssistantError::MemoryUnavailable("MONGODB_URI not set".into()))?;

        let mut options = ClientOptions::parse(uri)
            .run()
            .map_err(|e| AssistantError::MemoryUnavailable(format!("invalid MongoDB URI: {e}")))?;
        let timeout = Duration::from_millis(config.server_selection_timeout_ms);
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);

        let client = Client::with_options(options)
            .map_err(|e| AssistantError::MemoryUnavailable(format!("MongoDB client: {e}")))?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);

        info!(
            "memory store configured: db={} collection={}",
            config.database, config.collection
        );

        Ok(Self { collection })
    }

    /// Delete every remembered conversation. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::MemoryUnavailable`] if the delete fails.
    pub fn clear(&self) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! {})
            .run()
            .map_err(|e| AssistantError::MemoryUnavailable(format!("MongoDB delete: {e}")))?;
        info!(deleted = result.deleted_count, "memory cleared");
        Ok(result.deleted_count)
    }
}

impl MemoryStore for MongoMemoryStore {
    fn try_fetch_recent(&self, limit: usize) -> Result<Vec<MemoryRecord>> {
        // The server reads a zero limit as "no limit".
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut newest_first = Document::new();
        newest_first.insert(ORDER_FIELD, -1);
        let cursor = self
            .collection
            .find(doc! {})
            .projection(doc! { "_id": 0, "title": 1, "overview": 1, "content": 1, "local_time": 1 })
            .sort(newest_first)
            .limit(limit)
            .run()
            .map_err(|e| AssistantError::MemoryUnavailable(format!("MongoDB query: {e}")))?;

        let documents = cursor
            .collect::<std::result::Result<Vec<Document>, _>>()
            .map_err(|e| AssistantError::MemoryUnavailable(format!("MongoDB cursor: {e}")))?;
        Ok(records_oldest_first(documents))
    }
}

/// Turn a newest-first query result into chronological records.
fn records_oldest_first(newest_first: Vec<Document>) -> Vec<MemoryRecord> {
    newest_first.iter().rev().map(record_from_document).collect()
}

/// Extract the projected fields; non-string or missing fields become empty.
fn record_from_document(document: &Document) -> MemoryRecord {
    let text = |key: &str| document.get_str(key).unwrap_or_default().to_owned();
    let record = MemoryRecord::new(text("title"), text("overview"), text("content"));
    match document.get_str(ORDER_FIELD) {
        Ok(marker) => record.with_sequence_marker(marker),
        Err(_) => record,
    }
}
