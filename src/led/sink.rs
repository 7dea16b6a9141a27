//! Frame outputs for the LED renderer.

use super::patterns::Rgb;
use crate::config::LedConfig;
use crate::error::{AssistantError, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Receives fully composed frames.
pub trait FrameSink: Send {
    /// Push one frame to the strip.
    fn show(&mut self, pixels: &[Rgb]) -> Result<()>;
}

/// Writes raw GRB bytes, scaled by global brightness, to a pixel device
/// (e.g. a WS2812 character device or a FIFO read by a driver daemon).
pub struct DeviceSink {
    file: File,
    brightness: f32,
    buf: Vec<u8>,
}

impl DeviceSink {
    /// # Errors
    ///
    /// Returns [`AssistantError::Led`] if the device cannot be opened.
    pub fn open(path: &Path, brightness: f32) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| AssistantError::Led(format!("cannot open {}: {e}", path.display())))?;
        info!("LED output device: {}", path.display());
        Ok(Self {
            file,
            brightness: brightness.clamp(0.0, 1.0),
            buf: Vec::new(),
        })
    }
}

impl FrameSink for DeviceSink {
    fn show(&mut self, pixels: &[Rgb]) -> Result<()> {
        encode_grb(pixels, self.brightness, &mut self.buf);
        self.file
            .write_all(&self.buf)
            .and_then(|()| self.file.flush())
            .map_err(|e| AssistantError::Led(format!("frame write failed: {e}")))
    }
}

/// Discards frames. Used when no device is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn show(&mut self, _pixels: &[Rgb]) -> Result<()> {
        Ok(())
    }
}

/// Open the configured device, or a [`NullSink`] when none is set.
///
/// # Errors
///
/// Returns [`AssistantError::Led`] if a configured device cannot be opened.
pub fn open_sink(config: &LedConfig) -> Result<Box<dyn FrameSink>> {
    match &config.device {
        Some(path) => Ok(Box::new(DeviceSink::open(path, config.brightness)?)),
        None => Ok(Box::new(NullSink)),
    }
}

/// Serialise pixels as GRB triplets scaled by `brightness`.
fn encode_grb(pixels: &[Rgb], brightness: f32, out: &mut Vec<u8>) {
    out.clear();
    for px in pixels {
        let scaled = px.fade(brightness);
        out.extend_from_slice(&[scaled.g, scaled.r, scaled.b]);
    }
}
