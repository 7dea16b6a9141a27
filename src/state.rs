//! Assistant activity states and their canonical token names.

use crate::error::AssistantError;
use std::fmt;
use std::str::FromStr;

/// What the assistant is doing right now.
///
/// Exactly one state is current from the orchestrator's point of view. The
/// canonical name of each state is what gets written to the LED status
/// channel; `Idle` is published as `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssistantState {
    /// Not listening; LEDs dark.
    #[default]
    Idle,
    /// Waiting for a wake phrase.
    Listening,
    /// A wake phrase was just heard.
    WakeDetected,
    /// Turn window open, waiting for the user's request.
    Conversation,
    /// Building context and querying the language model.
    Thinking,
    /// Playing back the reply.
    Speaking,
}

impl AssistantState {
    /// States cycled through by the LED startup sequence.
    pub const STARTUP_SEQUENCE: [AssistantState; 5] = [
        AssistantState::Listening,
        AssistantState::WakeDetected,
        AssistantState::Conversation,
        AssistantState::Thinking,
        AssistantState::Speaking,
    ];

    /// Canonical token name written to the status channel.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "off",
            Self::Listening => "listening",
            Self::WakeDetected => "wake_detected",
            Self::Conversation => "conversation",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
        }
    }

    /// Parse a canonical token name. Surrounding whitespace is ignored;
    /// anything else unknown yields `None`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "off" => Some(Self::Idle),
            "listening" => Some(Self::Listening),
            "wake_detected" => Some(Self::WakeDetected),
            "conversation" => Some(Self::Conversation),
            "thinking" => Some(Self::Thinking),
            "speaking" => Some(Self::Speaking),
            _ => None,
        }
    }
}

impl fmt::Display for AssistantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssistantState {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| AssistantError::Status(format!("unknown state: {s:?}")))
    }
}
