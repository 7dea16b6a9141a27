//! Reply generation: persona + optional memory + utterance → model text.

use super::{ChatMessage, LanguageModel};
use crate::error::Result;
use crate::memory::MemoryRecord;
use tracing::info;

/// Heading of the memory system message.
pub const MEMORY_PREAMBLE: &str =
    "Your conversation memory (use only if relevant to the current question):";

/// Render records into the memory system message.
///
/// Returns `None` when no record has enough content to summarize.
#[must_use]
pub fn format_memory_context(records: &[MemoryRecord]) -> Option<String> {
    let entries: Vec<String> = records.iter().filter_map(MemoryRecord::summary).collect();
    if entries.is_empty() {
        return None;
    }
    Some(format!("{MEMORY_PREAMBLE}\n{}", entries.join("\n")))
}

/// Builds model requests and returns the generated reply.
pub struct ResponseGenerator {
    model: Box<dyn LanguageModel>,
    persona: String,
}

impl ResponseGenerator {
    /// Wrap a model with the given persona.
    pub fn new(model: Box<dyn LanguageModel>, persona: impl Into<String>) -> Self {
        Self {
            model,
            persona: persona.into(),
        }
    }

    /// Ordered message list for one request: persona, memory (if any),
    /// then the user utterance.
    #[must_use]
    pub fn build_messages(&self, utterance: &str, memory: &[MemoryRecord]) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(self.persona.clone())];
        if let Some(context) = format_memory_context(memory) {
            messages.push(ChatMessage::system(context));
        }
        messages.push(ChatMessage::user(utterance));
        messages
    }

    /// Generate a reply to `utterance`.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::AssistantError::GenerationUnavailable`] from the
    /// model; callers decide whether to apologise or stay silent.
    pub fn generate(&self, utterance: &str, memory: &[MemoryRecord]) -> Result<String> {
        let messages = self.build_messages(utterance, memory);
        info!(
            messages = messages.len(),
            memory_records = memory.len(),
            "generating reply"
        );
        self.model.complete(&messages)
    }
}
