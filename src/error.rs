//! Error types for the mizuna assistant.

/// Top-level error type for the assistant core.
///
/// Every variant is recoverable from the orchestrator's point of view: the
/// interaction loop logs it and degrades (skip memory, skip reply, skip
/// speech) instead of exiting.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Audio device or stream error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech recognition request failed.
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech synthesis request failed.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// The memory store could not be reached or queried.
    #[error("memory unavailable: {0}")]
    MemoryUnavailable(String),

    /// The language model is unreachable or misconfigured.
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// A detached renderer process could not be launched.
    #[error("renderer spawn failed: {0}")]
    RendererSpawn(String),

    /// Status token could not be written or parsed.
    #[error("status channel error: {0}")]
    Status(String),

    /// LED output device error.
    #[error("LED error: {0}")]
    Led(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
