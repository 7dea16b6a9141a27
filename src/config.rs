//! Configuration for the assistant.
//!
//! Loaded from TOML with every section defaulted, then overlaid with the
//! secrets and deployment settings read from the environment
//! (`GROQ_API_KEY`, `AZURE_SPEECH_*`, `MONGODB_*`).

use crate::error::{AssistantError, Result};
use crate::llm::DEFAULT_PERSONA;
use crate::wake::DEFAULT_WAKE_PHRASES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Wake phrase detection.
    pub wake: WakeConfig,
    /// Turn window and pacing of the interaction loop.
    pub conversation: ConversationConfig,
    /// Conversation memory store.
    pub memory: MemoryConfig,
    /// Language model endpoint.
    pub llm: LlmConfig,
    /// Speech recognition and synthesis.
    pub speech: SpeechConfig,
    /// LED status channel and renderer.
    pub led: LedConfig,
}

/// Wake phrase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeConfig {
    /// Literal phrases (case-insensitive substrings) that wake the assistant.
    pub phrases: Vec<String>,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_WAKE_PHRASES.iter().map(|p| (*p).to_owned()).collect(),
        }
    }
}

/// Interaction loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Seconds the assistant waits for a request after waking.
    pub turn_window_s: u64,
    /// Upper bound for a single recognition attempt, in ms.
    pub listen_timeout_ms: u64,
    /// Pause between unsuccessful recognition attempts inside the turn
    /// window, in ms.
    pub retry_interval_ms: u64,
    /// LEDs-off pause after a turn before listening again, in ms.
    pub settle_ms: u64,
    /// Whether to cycle through every LED state at startup.
    pub startup_sequence: bool,
    /// Time each state is shown during the startup sequence, in ms.
    pub startup_step_ms: u64,
    /// Spoken when no reply could be generated. Empty = stay silent.
    pub fallback_reply: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            turn_window_s: 15,
            listen_timeout_ms: 8_000,
            retry_interval_ms: 100,
            settle_ms: 1_000,
            startup_sequence: true,
            startup_step_ms: 500,
            fallback_reply: "Sorry, I can't think of an answer right now.".to_owned(),
        }
    }
}

impl ConversationConfig {
    /// Turn window as a duration.
    #[must_use]
    pub fn turn_window(&self) -> Duration {
        Duration::from_secs(self.turn_window_s)
    }

    /// Single recognition attempt bound as a duration.
    #[must_use]
    pub fn listen_timeout(&self) -> Duration {
        Duration::from_millis(self.listen_timeout_ms)
    }

    /// Retry pause as a duration.
    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Settle delay as a duration.
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Startup sequence step as a duration.
    #[must_use]
    pub fn startup_step(&self) -> Duration {
        Duration::from_millis(self.startup_step_ms)
    }
}

/// Memory store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// MongoDB connection string. `None` disables memory.
    pub uri: Option<String>,
    /// Database name.
    pub database: String,
    /// Collection name.
    pub collection: String,
    /// Number of recent records loaded into a turn.
    pub recent_limit: usize,
    /// Server selection / connect timeout in ms.
    pub server_selection_timeout_ms: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: "mizuna_companion".to_owned(),
            collection: "mizuna_ai".to_owned(),
            recent_limit: crate::memory::DEFAULT_RECENT_LIMIT,
            server_selection_timeout_ms: 5_000,
        }
    }
}

/// Language model configuration (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the API server, with or without a trailing `/v1`.
    pub api_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling threshold.
    pub top_p: f64,
    /// Maximum tokens per reply.
    pub max_tokens: u32,
    /// HTTP request timeout in seconds.
    pub request_timeout_s: u64,
    /// System persona sent as the first message of every request.
    pub persona: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai".to_owned(),
            api_key: String::new(),
            model: "openai/gpt-oss-20b".to_owned(),
            temperature: 0.3,
            top_p: 0.9,
            max_tokens: 200,
            request_timeout_s: 30,
            persona: DEFAULT_PERSONA.to_owned(),
        }
    }
}

/// Speech service and audio device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Azure speech subscription key.
    pub key: String,
    /// Azure region, e.g. `westeurope`.
    pub region: String,
    /// Synthesis voice name.
    pub voice: String,
    /// Recognition language.
    pub language: String,
    /// Input device name (None = system default).
    pub input_device: Option<String>,
    /// Output device name (None = system default).
    pub output_device: Option<String>,
    /// Sample rate sent to the recognizer, in Hz.
    pub sample_rate: u32,
    /// RMS level above which a captured block counts as speech.
    pub vad_threshold: f32,
    /// Trailing silence that ends an utterance, in ms.
    pub end_silence_ms: u64,
    /// HTTP request timeout in seconds.
    pub request_timeout_s: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            region: String::new(),
            voice: "en-US-JennyNeural".to_owned(),
            language: "en-US".to_owned(),
            input_device: None,
            output_device: None,
            sample_rate: 16_000,
            vad_threshold: 0.01,
            end_silence_ms: 900,
            request_timeout_s: 15,
        }
    }
}

/// Where the LED renderer runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedBackend {
    /// One long-lived renderer thread fed through a watch cell.
    #[default]
    InProcess,
    /// Status file plus one detached renderer process per publication.
    Process,
    /// No LED output.
    Disabled,
}

/// LED status channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedConfig {
    /// Renderer placement.
    pub backend: LedBackend,
    /// Status token file shared with detached renderers.
    pub status_file: PathBuf,
    /// Command (program + leading args) that launches a detached renderer.
    pub renderer_command: Vec<String>,
    /// Number of pixels on the strip.
    pub led_count: usize,
    /// Global brightness, 0.0–1.0.
    pub brightness: f32,
    /// Delay between animation frames in ms. Also the status poll interval.
    pub frame_interval_ms: u64,
    /// Pixel device receiving raw GRB frames. `None` discards frames.
    pub device: Option<PathBuf>,
    /// Loop a state's pattern until superseded instead of playing it once
    /// (detached renderers only; the in-process renderer always loops).
    pub repeat: bool,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            backend: LedBackend::default(),
            status_file: std::env::temp_dir().join("mizuna.led_state"),
            renderer_command: vec!["sudo".to_owned(), "mizuna-led".to_owned()],
            led_count: 64,
            brightness: 0.45,
            frame_interval_ms: 18,
            device: None,
            repeat: false,
        }
    }
}

impl LedConfig {
    /// Frame interval as a duration.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AssistantError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `path` when given, else from the default path when it
    /// exists, else defaults; then apply the environment overlay.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be loaded, or the
    /// default file exists but is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Overlay settings from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Overlay settings from `lookup`. Unset or blank variables leave the
    /// current value untouched.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GROQ_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = get("AZURE_SPEECH_KEY") {
            self.speech.key = v;
        }
        if let Some(v) = get("AZURE_SPEECH_REGION") {
            self.speech.region = v;
        }
        if let Some(v) = get("AZURE_SPEECH_VOICE") {
            self.speech.voice = v;
        }
        if let Some(v) = get("MONGODB_URI") {
            self.memory.uri = Some(v);
        }
        if let Some(v) = get("MONGODB_DB") {
            self.memory.database = v;
        }
        if let Some(v) = get("MONGODB_COLLECTION") {
            self.memory.collection = v;
        }
    }

    /// Returns the default config file path: `~/.config/mizuna/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("mizuna").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("mizuna")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/mizuna-config/config.toml")
        }
    }
}
