//! Blocking voice I/O over the speech capability.
//!
//! Sub-modules:
//! - `audio`: microphone capture with energy endpointing, speaker playback,
//!   WAV encoding (cpal + hound).
//! - `azure`: Azure Speech REST recognizer and synthesizer.

pub mod audio;
pub mod azure;

pub use azure::{AzureRecognizer, AzureSpeech, AzureSynthesizer};

use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one recognition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionResult {
    /// Speech was recognized.
    Recognized(String),
    /// Audio was captured but nothing intelligible was in it (or nothing
    /// was said before the timeout).
    NoMatch,
    /// The service refused or abandoned the request.
    Canceled(String),
    /// Local or transport failure.
    Error(String),
}

/// Outcome of one synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisResult {
    /// Audio was synthesized and played to the end.
    Completed,
    /// Synthesis or playback was abandoned.
    Canceled(String),
}

/// Recognize a single utterance from the configured input.
pub trait SpeechRecognizer: Send {
    /// Block until one utterance is recognized, nothing is heard within
    /// `timeout`, or the attempt fails.
    fn recognize_once(&mut self, timeout: Duration) -> RecognitionResult;
}

/// Speak text on the configured output.
pub trait SpeechSynthesizer: Send {
    /// Block until `text` has been spoken or synthesis is canceled.
    fn synthesize(&mut self, text: &str) -> SynthesisResult;
}

/// The orchestrator's view of the audio capability.
pub struct VoiceIo {
    recognizer: Box<dyn SpeechRecognizer>,
    synthesizer: Box<dyn SpeechSynthesizer>,
}

impl VoiceIo {
    pub fn new(
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            recognizer,
            synthesizer,
        }
    }

    /// Listen for one utterance. Non-`Recognized` results are logged here;
    /// the caller treats all of them as "try again".
    pub fn listen_once(&mut self, timeout: Duration) -> RecognitionResult {
        let result = self.recognizer.recognize_once(timeout);
        match &result {
            RecognitionResult::Recognized(text) => info!("Heard: {text}"),
            RecognitionResult::NoMatch => {}
            RecognitionResult::Canceled(reason) => warn!("speech recognition canceled: {reason}"),
            RecognitionResult::Error(e) => warn!("speech recognition error: {e}"),
        }
        result
    }

    /// Speak `text`, blocking until playback ends. Cancellation is logged,
    /// never retried.
    pub fn speak(&mut self, text: &str) {
        match self.synthesizer.synthesize(text) {
            SynthesisResult::Completed => info!("voice output completed for text: [{text}]"),
            SynthesisResult::Canceled(reason) => warn!("speech synthesis canceled: {reason}"),
        }
    }
}
