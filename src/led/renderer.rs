//! Animation renderer with cooperative cancellation.
//!
//! Before every frame the renderer samples its [`StatusSource`]. As soon as
//! the observed token supersedes the one it was started with, it returns;
//! nothing ever interrupts it from outside.

use super::patterns::{Rgb, pattern_for, pulse_levels};
use super::sink::FrameSink;
use super::token::{StatusSource, StatusToken};
use crate::clock::Clock;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Frames in one `pulse`.
const PULSE_STEPS: usize = 20;

/// Why [`AnimationRenderer::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The pattern finished (or the state has no pattern and the strip was
    /// cleared).
    Completed,
    /// A newer token was observed.
    Superseded,
}

/// Draws state patterns onto a [`FrameSink`].
pub struct AnimationRenderer {
    sink: Box<dyn FrameSink>,
    pixels: Vec<Rgb>,
    clock: Arc<dyn Clock>,
}

impl AnimationRenderer {
    pub fn new(sink: Box<dyn FrameSink>, led_count: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            sink,
            pixels: vec![Rgb::OFF; led_count],
            clock,
        }
    }

    /// Render `own`'s pattern until it completes or is superseded.
    ///
    /// With `repeat` the pattern loops until superseded. States without a
    /// pattern clear the strip and complete immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects a frame.
    pub fn run(
        &mut self,
        own: &StatusToken,
        source: &mut dyn StatusSource,
        repeat: bool,
    ) -> Result<RenderOutcome> {
        let Some(mut pattern) = pattern_for(own.state, self.pixels.len()) else {
            self.clear()?;
            return Ok(RenderOutcome::Completed);
        };
        info!(state = %own.state, generation = ?own.generation, "rendering");

        loop {
            for step in 0..pattern.steps() {
                let seen = source.observe();
                if own.is_superseded_by(&seen) {
                    debug!(own = %own, ?seen, "renderer superseded");
                    return Ok(RenderOutcome::Superseded);
                }
                self.pixels.fill(Rgb::OFF);
                pattern.render(step, &mut self.pixels);
                self.sink.show(&self.pixels)?;
                self.clock.sleep(pattern.frame_interval());
            }
            if !repeat {
                return Ok(RenderOutcome::Completed);
            }
        }
    }

    /// Turn every pixel off.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects the frame.
    pub fn clear(&mut self) -> Result<()> {
        self.pixels.fill(Rgb::OFF);
        self.sink.show(&self.pixels)
    }

    /// Pulse the whole strip in `colour` over `duration`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects a frame.
    pub fn pulse(&mut self, colour: Rgb, duration: Duration) -> Result<()> {
        let step = duration / PULSE_STEPS as u32;
        for level in pulse_levels(PULSE_STEPS) {
            self.pixels.fill(colour.fade(level).gamma());
            self.sink.show(&self.pixels)?;
            self.clock.sleep(step);
        }
        Ok(())
    }
}
