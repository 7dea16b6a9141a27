//! Mizuna: wake-word voice assistant with conversation memory and LED status.
//!
//! One synchronous loop drives the assistant:
//! Listening → WakeDetected → Conversation → Thinking → Speaking → Idle
//!
//! # Architecture
//!
//! - **Voice**: one-shot recognition and blocking synthesis over Azure
//!   Speech, with `cpal` capture and playback
//! - **Wake detection**: literal phrase matching on recognized text
//! - **Context gate**: keyword heuristics deciding whether memory is loaded
//! - **Memory**: recent conversation summaries from MongoDB
//! - **LLM**: OpenAI-compatible chat completions (Groq by default)
//! - **LED status**: generation-stamped state tokens rendered by a
//!   self-cancelling animation renderer

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod led;
pub mod llm;
pub mod memory;
pub mod orchestrator;
pub mod state;
pub mod turn;
pub mod voice;
pub mod wake;

pub use config::AssistantConfig;
pub use error::{AssistantError, Result};
pub use orchestrator::{CycleOutcome, Orchestrator};
pub use state::AssistantState;
pub use turn::ConversationTurn;
