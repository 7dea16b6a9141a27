//! Language model access.
//!
//! The assistant talks to any server implementing the OpenAI chat
//! completions API (Groq by default) through the blocking
//! [`ChatCompletionsClient`]. [`ResponseGenerator`] assembles the persona,
//! optional memory context and user utterance into one request.

pub mod api;
pub mod response;

pub use api::{ChatCompletionsClient, UnavailableModel};
pub use response::{MEMORY_PREAMBLE, ResponseGenerator, format_memory_context};

use crate::error::Result;

/// Persona sent as the first system message of every request.
pub const DEFAULT_PERSONA: &str = "You are Mizuna, a friendly robot assistant. Your responses should be:
- Concise and direct (typically 1-3 sentences)
- Conversational and engaging
- Free from emojis (as you use text-to-speech)

Always maintain a cheerful, helpful attitude. Only reference previous conversations when specifically relevant to the user's question.";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Instructions and context.
    System,
    /// The human operator.
    User,
}

impl Role {
    /// Wire name used by chat completion APIs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

/// A single message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// System message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Blocking chat completion capability.
pub trait LanguageModel: Send + Sync {
    /// Complete `messages` and return the text of the first choice.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssistantError::GenerationUnavailable`] when the
    /// model cannot be reached, rejects the request, or returns no choice.
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
