//! Shared fakes for integration tests.
//!
//! Every capability the orchestrator touches has a scripted or recording
//! stand-in here, all driven by one simulated clock.

use mizuna::clock::ManualClock;
use mizuna::config::AssistantConfig;
use mizuna::led::StatusPublisher;
use mizuna::llm::{ChatMessage, LanguageModel, ResponseGenerator};
use mizuna::memory::{MemoryRecord, MemoryStore};
use mizuna::voice::{
    RecognitionResult, SpeechRecognizer, SpeechSynthesizer, SynthesisResult, VoiceIo,
};
use mizuna::{AssistantError, AssistantState, Orchestrator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Time a spoken line takes to recognize.
pub(crate) const UTTERANCE_TIME: Duration = Duration::from_secs(1);

/// One scripted recognition attempt.
#[derive(Debug, Clone)]
pub(crate) enum Heard {
    /// Speech recognized after [`UTTERANCE_TIME`].
    Say(&'static str),
    /// Nothing heard for the whole timeout.
    Silence,
    /// The service failed immediately.
    Fail,
}

/// Plays a script, then requests shutdown once it runs out.
pub(crate) struct ScriptedRecognizer {
    script: VecDeque<Heard>,
    clock: Arc<ManualClock>,
    cancel: CancellationToken,
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn recognize_once(&mut self, timeout: Duration) -> RecognitionResult {
        match self.script.pop_front() {
            Some(Heard::Say(text)) => {
                self.clock.advance(UTTERANCE_TIME.min(timeout));
                RecognitionResult::Recognized(text.to_owned())
            }
            Some(Heard::Silence) => {
                self.clock.advance(timeout);
                RecognitionResult::NoMatch
            }
            Some(Heard::Fail) => RecognitionResult::Error("connection reset".to_owned()),
            None => {
                self.cancel.cancel();
                RecognitionResult::NoMatch
            }
        }
    }
}

/// Remembers everything it was asked to say.
pub(crate) struct RecordingSynthesizer {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn synthesize(&mut self, text: &str) -> SynthesisResult {
        self.spoken.lock().expect("spoken lock").push(text.to_owned());
        SynthesisResult::Completed
    }
}

/// Remembers every published state.
pub(crate) struct RecordingPublisher {
    states: Arc<Mutex<Vec<AssistantState>>>,
    shutdowns: Arc<AtomicUsize>,
}

impl StatusPublisher for RecordingPublisher {
    fn publish(&mut self, state: AssistantState) {
        self.states.lock().expect("states lock").push(state);
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// How the fake memory store behaves.
pub(crate) enum Memory {
    Records(Vec<MemoryRecord>),
    Down,
}

struct FakeMemory {
    behaviour: Memory,
    calls: Arc<AtomicUsize>,
}

impl MemoryStore for FakeMemory {
    fn try_fetch_recent(&self, limit: usize) -> mizuna::Result<Vec<MemoryRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Memory::Records(records) => Ok(records.iter().take(limit).cloned().collect()),
            Memory::Down => Err(AssistantError::MemoryUnavailable(
                "connection refused".to_owned(),
            )),
        }
    }
}

/// How the fake language model behaves.
pub(crate) enum Model {
    Reply(&'static str),
    Down,
}

struct FakeModel {
    behaviour: Model,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl LanguageModel for FakeModel {
    fn complete(&self, messages: &[ChatMessage]) -> mizuna::Result<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(messages.to_vec());
        match self.behaviour {
            Model::Reply(text) => Ok(text.to_owned()),
            Model::Down => Err(AssistantError::GenerationUnavailable(
                "GROQ_API_KEY missing".to_owned(),
            )),
        }
    }
}

/// An orchestrator wired to fakes, plus handles onto what they saw.
pub(crate) struct Harness {
    pub orchestrator: Orchestrator,
    pub clock: Arc<ManualClock>,
    pub cancel: CancellationToken,
    pub published: Arc<Mutex<Vec<AssistantState>>>,
    pub shutdowns: Arc<AtomicUsize>,
    pub spoken: Arc<Mutex<Vec<String>>>,
    pub requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    pub memory_calls: Arc<AtomicUsize>,
}

impl Harness {
    pub fn published(&self) -> Vec<AssistantState> {
        self.published.lock().expect("states lock").clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().expect("spoken lock").clone()
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().expect("requests lock").clone()
    }
}

/// Default config with the startup light show off.
pub(crate) fn test_config() -> AssistantConfig {
    let mut config = AssistantConfig::default();
    config.conversation.startup_sequence = false;
    config.llm.persona = "persona".to_owned();
    config
}

pub(crate) fn harness(script: Vec<Heard>, memory: Memory, model: Model) -> Harness {
    harness_with(test_config(), script, memory, model)
}

pub(crate) fn harness_with(
    config: AssistantConfig,
    script: Vec<Heard>,
    memory: Memory,
    model: Model,
) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let cancel = CancellationToken::new();
    let published = Arc::new(Mutex::new(Vec::new()));
    let shutdowns = Arc::new(AtomicUsize::new(0));
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let memory_calls = Arc::new(AtomicUsize::new(0));

    let recognizer = ScriptedRecognizer {
        script: script.into(),
        clock: Arc::clone(&clock),
        cancel: cancel.clone(),
    };
    let synthesizer = RecordingSynthesizer {
        spoken: Arc::clone(&spoken),
    };
    let publisher = RecordingPublisher {
        states: Arc::clone(&published),
        shutdowns: Arc::clone(&shutdowns),
    };
    let store = FakeMemory {
        behaviour: memory,
        calls: Arc::clone(&memory_calls),
    };
    let model = FakeModel {
        behaviour: model,
        requests: Arc::clone(&requests),
    };

    let orchestrator = Orchestrator::new(
        &config,
        VoiceIo::new(Box::new(recognizer), Box::new(synthesizer)),
        Box::new(store),
        ResponseGenerator::new(Box::new(model), config.llm.persona.clone()),
        Box::new(publisher),
        clock.clone(),
    );

    Harness {
        orchestrator,
        clock,
        cancel,
        published,
        shutdowns,
        spoken,
        requests,
        memory_calls,
    }
}
