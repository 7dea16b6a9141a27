//! LED status channel.
//!
//! The orchestrator publishes every state through a [`StatusPublisher`].
//! [`LedStatusChannel`] stamps each change with a generation and hands it
//! either to one long-lived renderer thread or, for setups where the strip
//! needs root, to a status file plus a detached `mizuna-led` process.
//!
//! Renderers cancel themselves: they poll the status before every frame
//! and stop when a newer token appears.

pub mod channel;
pub mod file;
pub mod patterns;
pub mod renderer;
pub mod sink;
pub mod task;
pub mod token;

pub use channel::{LedStatusChannel, StatusPublisher};
pub use file::StatusFile;
pub use patterns::Rgb;
pub use renderer::{AnimationRenderer, RenderOutcome};
pub use sink::{DeviceSink, FrameSink, NullSink, open_sink};
pub use task::RendererTask;
pub use token::{StatusRead, StatusSource, StatusToken};
