//! Azure Speech over its REST endpoints.
//!
//! Recognition posts one WAV utterance to the short-audio endpoint and maps
//! `RecognitionStatus` onto [`RecognitionResult`]. Synthesis posts SSML and
//! plays the returned RIFF audio.

use super::audio::{Microphone, Speaker, decode_wav, encode_wav};
use super::{RecognitionResult, SpeechRecognizer, SpeechSynthesizer, SynthesisResult};
use crate::config::SpeechConfig;
use crate::error::{AssistantError, Result};
use std::io::Read;
use std::time::{Duration, Instant};
use tracing::debug;

/// Output format requested from the synthesis endpoint.
const TTS_OUTPUT_FORMAT: &str = "riff-24khz-16bit-mono-pcm";

/// Credentials and endpoints for one Azure Speech resource.
#[derive(Clone)]
pub struct AzureSpeech {
    key: String,
    region: String,
    language: String,
    voice: String,
    agent: ureq::Agent,
}

impl AzureSpeech {
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] when the key or region is missing.
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        if config.key.trim().is_empty() || config.region.trim().is_empty() {
            return Err(AssistantError::Config(
                "AZURE_SPEECH_KEY and AZURE_SPEECH_REGION are required".to_owned(),
            ));
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_s))
            .build();
        Ok(Self {
            key: config.key.clone(),
            region: config.region.clone(),
            language: config.language.clone(),
            voice: config.voice.clone(),
            agent,
        })
    }

    fn recognition_url(&self) -> String {
        format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language={}&format=simple",
            self.region, self.language
        )
    }

    fn synthesis_url(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }

    /// Transcribe one WAV-encoded utterance.
    pub fn transcribe(&self, wav: &[u8], sample_rate: u32) -> RecognitionResult {
        let started = Instant::now();
        let response = self
            .agent
            .post(&self.recognition_url())
            .set("Ocp-Apim-Subscription-Key", &self.key)
            .set(
                "Content-Type",
                &format!("audio/wav; codecs=audio/pcm; samplerate={sample_rate}"),
            )
            .set("Accept", "application/json")
            .send_bytes(wav);

        let body = match response {
            Ok(response) => match response.into_string() {
                Ok(body) => body,
                Err(e) => return RecognitionResult::Error(format!("read error: {e}")),
            },
            Err(ureq::Error::Status(code, _)) => {
                return RecognitionResult::Canceled(format!("service returned {code}"));
            }
            Err(ureq::Error::Transport(t)) => return RecognitionResult::Error(t.to_string()),
        };

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "recognition response received"
        );
        parse_recognition_response(&body)
    }

    /// Synthesize `text` into RIFF audio bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Synthesis`] on HTTP or read failure.
    pub fn synthesize_wav(&self, text: &str) -> Result<Vec<u8>> {
        let body = ssml(&self.language, &self.voice, text);
        let response = self
            .agent
            .post(&self.synthesis_url())
            .set("Ocp-Apim-Subscription-Key", &self.key)
            .set("Content-Type", "application/ssml+xml")
            .set("X-Microsoft-OutputFormat", TTS_OUTPUT_FORMAT)
            .set("User-Agent", "mizuna")
            .send_string(&body)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    AssistantError::Synthesis(format!("service returned {code}"))
                }
                ureq::Error::Transport(t) => AssistantError::Synthesis(t.to_string()),
            })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| AssistantError::Synthesis(format!("read error: {e}")))?;
        Ok(bytes)
    }
}

/// Recognizer: microphone endpointing + Azure transcription.
pub struct AzureRecognizer {
    speech: AzureSpeech,
    microphone: Microphone,
}

impl AzureRecognizer {
    pub fn new(speech: AzureSpeech, microphone: Microphone) -> Self {
        Self { speech, microphone }
    }
}

impl SpeechRecognizer for AzureRecognizer {
    fn recognize_once(&mut self, timeout: Duration) -> RecognitionResult {
        let samples = match self.microphone.record_utterance(timeout) {
            Ok(Some(samples)) => samples,
            Ok(None) => return RecognitionResult::NoMatch,
            Err(e) => return RecognitionResult::Error(e.to_string()),
        };
        let rate = self.microphone.sample_rate();
        match encode_wav(&samples, rate) {
            Ok(wav) => self.speech.transcribe(&wav, rate),
            Err(e) => RecognitionResult::Error(e.to_string()),
        }
    }
}

/// Synthesizer: Azure text-to-speech + speaker playback.
pub struct AzureSynthesizer {
    speech: AzureSpeech,
    speaker: Speaker,
}

impl AzureSynthesizer {
    pub fn new(speech: AzureSpeech, speaker: Speaker) -> Self {
        Self { speech, speaker }
    }
}

impl SpeechSynthesizer for AzureSynthesizer {
    fn synthesize(&mut self, text: &str) -> SynthesisResult {
        let played = self
            .speech
            .synthesize_wav(text)
            .and_then(|wav| decode_wav(&wav))
            .and_then(|(samples, rate)| self.speaker.play(&samples, rate));
        match played {
            Ok(()) => SynthesisResult::Completed,
            Err(e) => SynthesisResult::Canceled(e.to_string()),
        }
    }
}

/// Map a `format=simple` recognition body onto a result.
pub fn parse_recognition_response(body: &str) -> RecognitionResult {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => return RecognitionResult::Error(format!("JSON parse error: {e}")),
    };
    let status = value["RecognitionStatus"].as_str().unwrap_or_default();
    match status {
        "Success" => {
            let text = value["DisplayText"].as_str().unwrap_or_default().trim();
            if text.is_empty() {
                RecognitionResult::NoMatch
            } else {
                RecognitionResult::Recognized(text.to_owned())
            }
        }
        "NoMatch" | "InitialSilenceTimeout" | "BabbleTimeout" => RecognitionResult::NoMatch,
        "Error" => RecognitionResult::Error("service reported an error".to_owned()),
        other => RecognitionResult::Canceled(format!("recognition status {other:?}")),
    }
}

fn ssml(language: &str, voice: &str, text: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        xml_escape(language),
        xml_escape(voice),
        xml_escape(text)
    )
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
