//! Status tokens: the encoded state carried by the status channel.
//!
//! Wire format is `<state>:<generation>`, e.g. `thinking:12`. A bare
//! `<state>` is accepted from writers that predate generations. Anything
//! else (including an empty or half-written file) reads as unknown.

use crate::state::AssistantState;
use std::fmt;

/// One publication on the status channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusToken {
    pub state: AssistantState,
    /// Monotonic publication counter; `None` for bare legacy tokens.
    pub generation: Option<u64>,
}

impl StatusToken {
    #[must_use]
    pub fn new(state: AssistantState, generation: u64) -> Self {
        Self {
            state,
            generation: Some(generation),
        }
    }

    /// A token without a generation.
    #[must_use]
    pub fn bare(state: AssistantState) -> Self {
        Self {
            state,
            generation: None,
        }
    }

    /// Parse the wire format. Returns `None` for unrecognised content.
    #[must_use]
    pub fn parse(content: &str) -> Option<Self> {
        let content = content.trim();
        match content.split_once(':') {
            Some((state, generation)) => {
                let state = AssistantState::from_token(state)?;
                let generation = generation.trim().parse::<u64>().ok()?;
                Some(Self::new(state, generation))
            }
            None => AssistantState::from_token(content).map(Self::bare),
        }
    }

    /// Encode to the wire format.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Whether a renderer started for `self` must stop after observing `read`.
    ///
    /// A different state, a different known generation, or unparseable
    /// content all supersede. An unreadable location does not: renderers
    /// fail open and keep drawing their own state.
    #[must_use]
    pub fn is_superseded_by(&self, read: &StatusRead) -> bool {
        match read {
            StatusRead::Token(seen) => {
                if seen.state != self.state {
                    return true;
                }
                matches!((self.generation, seen.generation), (Some(a), Some(b)) if a != b)
            }
            StatusRead::Unknown => true,
            StatusRead::Unreadable => false,
        }
    }
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            Some(generation) => write!(f, "{}:{generation}", self.state),
            None => f.write_str(self.state.as_str()),
        }
    }
}

/// Result of sampling a status location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRead {
    /// A valid token.
    Token(StatusToken),
    /// Content was present but not a valid token.
    Unknown,
    /// The location could not be read at all.
    Unreadable,
}

impl StatusRead {
    /// Classify raw status content.
    #[must_use]
    pub fn from_content(content: &str) -> Self {
        StatusToken::parse(content).map_or(Self::Unknown, Self::Token)
    }
}

/// Anything a renderer can poll for the current token.
pub trait StatusSource {
    /// Sample the current status. Called once per frame.
    fn observe(&mut self) -> StatusRead;
}
