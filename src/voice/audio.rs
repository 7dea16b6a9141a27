//! Microphone capture, speaker playback and WAV helpers.
//!
//! Capture runs at the device's native rate and is mixed down and
//! resampled to the recognizer rate (16kHz by default). An energy
//! endpointer decides when an utterance starts and ends, so one call to
//! [`Microphone::record_utterance`] yields one utterance or nothing.
//!
//! Devices are resolved on every call instead of being held: cpal device
//! handles are not `Send` on every host, and the recognizer has to be.

use crate::error::{AssistantError, Result};
use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// How long the capture loop waits for one audio block.
const BLOCK_WAIT: Duration = Duration::from_millis(50);

/// Energy-based utterance endpointer.
#[derive(Debug, Clone)]
pub struct Endpointer {
    threshold: f32,
    end_silence_samples: usize,
    started: bool,
    silence_run: usize,
    preroll: Vec<f32>,
    samples: Vec<f32>,
}

/// Where the endpointer is after consuming a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// No speech yet.
    Waiting,
    /// Speech in progress.
    Speaking,
    /// Speech followed by enough trailing silence.
    Complete,
}

impl Endpointer {
    /// `end_silence` of sub-threshold audio after speech ends the utterance.
    #[must_use]
    pub fn new(threshold: f32, end_silence: Duration, sample_rate: u32) -> Self {
        let end_silence_samples =
            (end_silence.as_secs_f64() * f64::from(sample_rate)).round() as usize;
        Self {
            threshold,
            end_silence_samples,
            started: false,
            silence_run: 0,
            preroll: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Consume one block of mono samples.
    pub fn push(&mut self, block: &[f32]) -> EndpointState {
        let loud = rms(block) >= self.threshold;

        if !self.started {
            if !loud {
                // Keep the last quiet block so the first syllable is not clipped.
                self.preroll.clear();
                self.preroll.extend_from_slice(block);
                return EndpointState::Waiting;
            }
            self.started = true;
            self.samples.append(&mut self.preroll);
        }

        self.samples.extend_from_slice(block);
        if loud {
            self.silence_run = 0;
        } else {
            self.silence_run += block.len();
        }

        if self.silence_run >= self.end_silence_samples {
            EndpointState::Complete
        } else {
            EndpointState::Speaking
        }
    }

    /// Captured utterance, or `None` if speech never started.
    #[must_use]
    pub fn finish(self) -> Option<Vec<f32>> {
        self.started.then_some(self.samples)
    }
}

/// Root-mean-square level of a block.
fn rms(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let sum: f32 = block.iter().map(|s| s * s).sum();
    (sum / block.len() as f32).sqrt()
}

/// Microphone input for one-shot utterance capture.
#[derive(Debug, Clone)]
pub struct Microphone {
    device_name: Option<String>,
    target_sample_rate: u32,
    threshold: f32,
    end_silence: Duration,
}

impl Microphone {
    /// Create a microphone on `device_name` (None = system default).
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be found.
    pub fn new(
        device_name: Option<String>,
        target_sample_rate: u32,
        threshold: f32,
        end_silence: Duration,
    ) -> Result<Self> {
        let mic = Self {
            device_name,
            target_sample_rate,
            threshold,
            end_silence,
        };
        let (device, _) = mic.open()?;
        let name = device
            .description()
            .map(|d| d.name().to_owned())
            .unwrap_or_else(|_| "<unknown>".into());
        info!("using input device: {name}");
        Ok(mic)
    }

    fn open(&self) -> Result<(cpal::Device, StreamConfig)> {
        let host = cpal::default_host();
        let device = if let Some(ref name) = self.device_name {
            host.input_devices()
                .map_err(|e| AssistantError::Audio(format!("cannot enumerate devices: {e}")))?
                .find(|d| {
                    d.description()
                        .ok()
                        .map(|desc| desc.name() == name)
                        .unwrap_or(false)
                })
                .ok_or_else(|| AssistantError::Audio(format!("input device '{name}' not found")))?
        } else {
            host.default_input_device()
                .ok_or_else(|| AssistantError::Audio("no default input device".into()))?
        };

        let default_config = device
            .default_input_config()
            .map_err(|e| AssistantError::Audio(format!("no default input config: {e}")))?;
        let stream_config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: default_config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        Ok((device, stream_config))
    }

    /// Record one utterance.
    ///
    /// Waits up to `timeout` overall. Returns `Ok(None)` when no speech
    /// started in that time; an utterance still running at the deadline is
    /// returned as captured so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the input stream cannot be opened.
    pub fn record_utterance(&self, timeout: Duration) -> Result<Option<Vec<f32>>> {
        let (device, stream_config) = self.open()?;
        let native_rate = stream_config.sample_rate;
        let native_channels = stream_config.channels;
        let target_rate = self.target_sample_rate;

        let (tx, rx) = crossbeam_channel::bounded::<Vec<f32>>(64);
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    let mono = if native_channels > 1 {
                        to_mono(data, native_channels)
                    } else {
                        data.to_vec()
                    };
                    let block = resample(&mono, native_rate, target_rate);
                    if tx.try_send(block).is_err() {
                        debug!("capture channel full, dropping block");
                    }
                },
                move |err| {
                    error!("audio input stream error: {err}");
                },
                None,
            )
            .map_err(|e| AssistantError::Audio(format!("failed to build input stream: {e}")))?;

        stream
            .play()
            .map_err(|e| AssistantError::Audio(format!("failed to start input stream: {e}")))?;

        let mut endpointer = Endpointer::new(self.threshold, self.end_silence, target_rate);
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            match rx.recv_timeout(BLOCK_WAIT) {
                Ok(block) => {
                    if endpointer.push(&block) == EndpointState::Complete {
                        break;
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    return Err(AssistantError::Audio("input stream closed".into()));
                }
            }
        }

        drop(stream);
        Ok(endpointer.finish())
    }

    /// Sample rate of captured utterances.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// List available input devices.
    ///
    /// # Errors
    ///
    /// Returns an error if devices cannot be enumerated.
    pub fn list_input_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| AssistantError::Audio(format!("cannot enumerate devices: {e}")))?;
        Ok(devices
            .filter_map(|d| d.description().ok().map(|desc| desc.name().to_owned()))
            .collect())
    }
}

/// Speaker output for blocking playback.
#[derive(Debug, Clone)]
pub struct Speaker {
    device_name: Option<String>,
}

impl Speaker {
    /// Create a speaker on `device_name` (None = system default).
    #[must_use]
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    fn open(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();
        if let Some(ref name) = self.device_name {
            host.output_devices()
                .map_err(|e| AssistantError::Audio(format!("cannot enumerate devices: {e}")))?
                .find(|d| {
                    d.description()
                        .ok()
                        .map(|desc| desc.name() == name)
                        .unwrap_or(false)
                })
                .ok_or_else(|| AssistantError::Audio(format!("output device '{name}' not found")))
        } else {
            host.default_output_device()
                .ok_or_else(|| AssistantError::Audio("no default output device".into()))
        }
    }

    /// Play mono samples, blocking until all have been played.
    ///
    /// # Errors
    ///
    /// Returns an error if the audio stream cannot be created or played.
    pub fn play(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        let device = self.open()?;
        let stream_config = StreamConfig {
            channels: 1,
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let buffer = Arc::new(Mutex::new(PlaybackBuffer {
            samples: samples.to_vec(),
            position: 0,
            finished: false,
        }));
        let buffer_clone = Arc::clone(&buffer);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    let Ok(mut buf) = buffer_clone.lock() else {
                        return;
                    };
                    for sample in data.iter_mut() {
                        if buf.position < buf.samples.len() {
                            *sample = buf.samples[buf.position];
                            buf.position += 1;
                        } else {
                            *sample = 0.0;
                            buf.finished = true;
                        }
                    }
                },
                move |err| {
                    error!("audio output stream error: {err}");
                },
                None,
            )
            .map_err(|e| AssistantError::Audio(format!("failed to build output stream: {e}")))?;

        stream
            .play()
            .map_err(|e| AssistantError::Audio(format!("failed to start output stream: {e}")))?;

        loop {
            std::thread::sleep(Duration::from_millis(10));
            let buf = buffer
                .lock()
                .map_err(|e| AssistantError::Audio(format!("playback buffer lock poisoned: {e}")))?;
            if buf.finished {
                break;
            }
        }

        drop(stream);
        Ok(())
    }

    /// List available output devices.
    ///
    /// # Errors
    ///
    /// Returns an error if devices cannot be enumerated.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| AssistantError::Audio(format!("cannot enumerate devices: {e}")))?;
        Ok(devices
            .filter_map(|d| d.description().ok().map(|desc| desc.name().to_owned()))
            .collect())
    }
}

/// Internal buffer for tracking playback progress.
struct PlaybackBuffer {
    samples: Vec<f32>,
    position: usize,
    finished: bool,
}

/// Average interleaved channels into mono.
fn to_mono(data: &[f32], channels: u16) -> Vec<f32> {
    let ch = usize::from(channels);
    data.chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Linear-interpolation resampler. Adequate for speech below 8kHz.
fn resample(samples: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || samples.is_empty() || dst_rate == 0 {
        return samples.to_vec();
    }
    let ratio = f64::from(src_rate) / f64::from(dst_rate);
    let out_len = (samples.len() as f64 / ratio) as usize;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos as usize;
            let frac = pos - idx as f64;
            match samples.get(idx + 1) {
                Some(&next) => (f64::from(samples[idx]) * (1.0 - frac) + f64::from(next) * frac) as f32,
                None => samples[idx.min(samples.len() - 1)],
            }
        })
        .collect()
}

/// Encode mono f32 samples as a 16-bit PCM WAV file in memory.
///
/// # Errors
///
/// Returns an error if the WAV writer fails.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec)
            .map_err(|e| AssistantError::Audio(format!("WAV writer: {e}")))?;
        for &s in samples {
            let pcm = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            writer
                .write_sample(pcm)
                .map_err(|e| AssistantError::Audio(format!("WAV write: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| AssistantError::Audio(format!("WAV finalize: {e}")))?;
    }
    Ok(bytes)
}

/// Decode a 16-bit PCM WAV file into mono f32 samples and its sample rate.
///
/// # Errors
///
/// Returns an error if the bytes are not a 16-bit integer WAV.
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| AssistantError::Audio(format!("invalid WAV: {e}")))?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(AssistantError::Audio(format!(
            "unsupported WAV format: {:?} {}-bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }
    let interleaved = reader
        .samples::<i16>()
        .map(|s| s.map(|v| f32::from(v) / f32::from(i16::MAX)))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| AssistantError::Audio(format!("WAV read: {e}")))?;
    let samples = if spec.channels > 1 {
        to_mono(&interleaved, spec.channels)
    } else {
        interleaved
    };
    Ok((samples, spec.sample_rate))
}
