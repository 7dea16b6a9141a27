//! Memory record type shared by every store backend.

use serde::{Deserialize, Serialize};

/// Records whose content is shorter than this (in characters) have the
/// content inlined into their summary.
pub const INLINE_CONTENT_LIMIT: usize = 300;

/// One remembered conversation, as written by the ingestion service.
///
/// The assistant only reads records. Stores may omit fields; missing
/// fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryRecord {
    /// Short title of the conversation.
    pub title: String,
    /// One or two sentence overview.
    pub overview: String,
    /// Longer free-form content.
    pub content: String,
    /// Ordering marker (local ISO-8601 time at ingestion), when the store
    /// returns it.
    #[serde(rename = "local_time", skip_serializing_if = "Option::is_none")]
    pub sequence_marker: Option<String>,
}

impl MemoryRecord {
    /// Convenience constructor used by stores and tests.
    pub fn new(
        title: impl Into<String>,
        overview: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            overview: overview.into(),
            content: content.into(),
            sequence_marker: None,
        }
    }

    /// Attach the ordering marker.
    #[must_use]
    pub fn with_sequence_marker(mut self, marker: impl Into<String>) -> Self {
        self.sequence_marker = Some(marker.into());
        self
    }

    /// One-line summary for the model prompt.
    ///
    /// Returns `None` when the title or overview is empty: such records
    /// carry too little to be worth the prompt space.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        if self.title.is_empty() || self.overview.is_empty() {
            return None;
        }
        let mut entry = format!("Previously discussed: {}. {}", self.title, self.overview);
        if !self.content.is_empty() && self.content.chars().count() < INLINE_CONTENT_LIMIT {
            entry.push_str(" Additional context: ");
            entry.push_str(&self.content);
        }
        Some(entry)
    }
}
