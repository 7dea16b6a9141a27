//! A single conversation turn: utterance in, reply out.

use crate::error::Result;
use crate::gate;
use crate::llm::{ResponseGenerator, format_memory_context};
use crate::memory::MemoryStore;
use tracing::{debug, info};

/// Transient record of one request/response exchange.
///
/// Created when an utterance is captured; dropped when the turn completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationTurn {
    /// What the user said.
    pub utterance: String,
    /// Context gate decision.
    pub load_context: bool,
    /// Memory system message sent with the request, if any.
    pub memory_context: Option<String>,
    /// Generated reply, or the fallback spoken in its place.
    pub reply: Option<String>,
}

impl ConversationTurn {
    /// Start a turn for `utterance`.
    pub fn new(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            ..Self::default()
        }
    }

    /// Run the gate, pull memory when it fires, and generate the reply.
    ///
    /// Memory failures are absorbed by the store; only generation errors
    /// are returned, and they leave `reply` unset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssistantError::GenerationUnavailable`] when the
    /// model cannot produce a reply.
    pub fn respond(
        &mut self,
        memory: &dyn MemoryStore,
        generator: &ResponseGenerator,
        memory_limit: usize,
    ) -> Result<&str> {
        let rules = gate::matched_rules(&self.utterance);
        self.load_context = !rules.is_empty();
        debug!(?rules, "context gate evaluated");

        let records = if self.load_context {
            memory.fetch_recent(memory_limit)
        } else {
            Vec::new()
        };
        self.memory_context = format_memory_context(&records);

        let reply = generator.generate(&self.utterance, &records)?;
        info!("Assistant: {reply}");
        Ok(self.reply.insert(reply).as_str())
    }
}
