//! Long-lived in-process renderer.
//!
//! One thread owns the [`AnimationRenderer`] for the whole session. New
//! tokens arrive through a single-slot `watch` cell; the running animation
//! sees the newer token on its next poll and yields to it, so two
//! animations never draw at once.

use super::renderer::{AnimationRenderer, RenderOutcome};
use super::token::{StatusRead, StatusSource, StatusToken};
use crate::error::{AssistantError, Result};
use crate::state::AssistantState;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Handle to the renderer thread.
pub struct RendererTask {
    tx: watch::Sender<StatusToken>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RendererTask {
    /// Start the renderer thread, initially dark.
    ///
    /// `idle_poll` is how often the thread checks for a new token while no
    /// animation is running.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::RendererSpawn`] if the thread cannot start.
    pub fn spawn(renderer: AnimationRenderer, idle_poll: Duration) -> Result<Self> {
        let (tx, rx) = watch::channel(StatusToken::new(AssistantState::Idle, 0));
        let cancel = CancellationToken::new();
        let source = WatchSource {
            rx,
            cancel: cancel.clone(),
        };

        let handle = std::thread::Builder::new()
            .name("mizuna-led".to_owned())
            .spawn(move || render_loop(renderer, source, idle_poll))
            .map_err(|e| AssistantError::RendererSpawn(format!("renderer thread: {e}")))?;

        Ok(Self {
            tx,
            cancel,
            handle: Some(handle),
        })
    }

    /// Replace the current token. Never blocks.
    pub fn send(&self, token: StatusToken) {
        self.tx.send_replace(token);
    }

    /// Token most recently sent.
    #[must_use]
    pub fn current(&self) -> StatusToken {
        *self.tx.borrow()
    }

    /// Ask the renderer to stop and wait for it to clear the strip.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("LED renderer thread panicked");
        }
    }
}

impl Drop for RendererTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Status source backed by the watch cell. Cancellation reads as unknown
/// content, which stops any animation.
struct WatchSource {
    rx: watch::Receiver<StatusToken>,
    cancel: CancellationToken,
}

impl StatusSource for WatchSource {
    fn observe(&mut self) -> StatusRead {
        if self.cancel.is_cancelled() {
            return StatusRead::Unknown;
        }
        StatusRead::Token(*self.rx.borrow())
    }
}

fn render_loop(mut renderer: AnimationRenderer, mut source: WatchSource, idle_poll: Duration) {
    info!("LED renderer started");
    'session: while !source.cancel.is_cancelled() {
        let token = *source.rx.borrow_and_update();
        match renderer.run(&token, &mut source, true) {
            Ok(RenderOutcome::Superseded) => continue,
            Ok(RenderOutcome::Completed) => debug!(token = %token, "renderer idle"),
            Err(e) => warn!("LED render failed: {e}"),
        }

        // Dark (or failed) until the next token.
        loop {
            if source.cancel.is_cancelled() {
                break 'session;
            }
            match source.rx.has_changed() {
                Ok(true) => break,
                Ok(false) => std::thread::sleep(idle_poll),
                Err(_) => break 'session,
            }
        }
    }

    if let Err(e) = renderer.clear() {
        warn!("LED clear on shutdown failed: {e}");
    }
    info!("LED renderer stopped");
}
