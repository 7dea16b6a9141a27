//! The wake → conversation → response state machine.
//!
//! Everything here runs on one thread. Recognition, memory lookup,
//! generation and synthesis all block; the only deadline the orchestrator
//! owns is the turn window, checked against [`Clock`] between recognition
//! attempts. Failures are logged and degraded, never retried.

use crate::clock::Clock;
use crate::config::{AssistantConfig, ConversationConfig};
use crate::led::StatusPublisher;
use crate::llm::ResponseGenerator;
use crate::memory::MemoryStore;
use crate::state::AssistantState;
use crate::turn::ConversationTurn;
use crate::voice::{RecognitionResult, VoiceIo};
use crate::wake::WakeDetector;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How one wake → conversation cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// An utterance was answered (or a reply was attempted).
    Replied(ConversationTurn),
    /// The turn window closed without a usable utterance.
    TimedOut,
    /// Shutdown was requested.
    Cancelled,
}

/// Drives the assistant through its states.
pub struct Orchestrator {
    config: ConversationConfig,
    memory_limit: usize,
    wake: WakeDetector,
    voice: VoiceIo,
    memory: Box<dyn MemoryStore>,
    generator: ResponseGenerator,
    status: Box<dyn StatusPublisher>,
    clock: Arc<dyn Clock>,
    state: AssistantState,
}

impl Orchestrator {
    pub fn new(
        config: &AssistantConfig,
        voice: VoiceIo,
        memory: Box<dyn MemoryStore>,
        generator: ResponseGenerator,
        status: Box<dyn StatusPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: config.conversation.clone(),
            memory_limit: config.memory.recent_limit,
            wake: WakeDetector::new(&config.wake.phrases),
            voice,
            memory,
            generator,
            status,
            clock,
            state: AssistantState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AssistantState {
        self.state
    }

    /// Enter `next` and publish it exactly once.
    fn transition(&mut self, next: AssistantState) {
        if next != self.state {
            info!(from = %self.state, to = %next, "state transition");
        }
        self.state = next;
        self.status.publish(next);
    }

    /// Blank the LEDs and, if enabled, cycle every state pattern once.
    pub fn startup(&mut self) {
        let step = self.config.startup_step();
        self.transition(AssistantState::Idle);
        self.clock.sleep(step);

        if self.config.startup_sequence {
            info!("LED startup sequence");
            for state in AssistantState::STARTUP_SEQUENCE {
                self.transition(state);
                self.clock.sleep(step);
            }
            self.transition(AssistantState::Idle);
            self.clock.sleep(step);
        }
    }

    /// Run until `cancel` fires, then shut down.
    pub fn run(&mut self, cancel: &CancellationToken) {
        self.startup();
        while !cancel.is_cancelled() {
            if self.run_cycle(cancel) == CycleOutcome::Cancelled {
                break;
            }
        }
        self.shutdown();
    }

    /// One full cycle: wait for a wake phrase, hold the turn window open,
    /// answer, then go dark for the settle delay.
    pub fn run_cycle(&mut self, cancel: &CancellationToken) -> CycleOutcome {
        if !self.wait_for_wake(cancel) {
            return CycleOutcome::Cancelled;
        }

        let outcome = self.converse(cancel);
        if outcome == CycleOutcome::Cancelled {
            return outcome;
        }

        self.transition(AssistantState::Idle);
        self.clock.sleep(self.config.settle());
        outcome
    }

    /// Listen until an utterance contains a wake phrase. Returns `false` if
    /// cancelled first.
    fn wait_for_wake(&mut self, cancel: &CancellationToken) -> bool {
        self.transition(AssistantState::Listening);
        let timeout = self.config.listen_timeout();

        loop {
            if cancel.is_cancelled() {
                return false;
            }
            match self.voice.listen_once(timeout) {
                RecognitionResult::Recognized(text) => {
                    if let Some(phrase) = self.wake.detect(&text) {
                        info!(phrase, "wake phrase detected");
                        self.transition(AssistantState::WakeDetected);
                        return true;
                    }
                }
                RecognitionResult::NoMatch => {}
                RecognitionResult::Canceled(_) | RecognitionResult::Error(_) => {
                    self.clock.sleep(self.config.retry_interval());
                }
            }
        }
    }

    /// Hold the turn window open for one request.
    fn converse(&mut self, cancel: &CancellationToken) -> CycleOutcome {
        self.transition(AssistantState::Conversation);
        let deadline = self.clock.now() + self.config.turn_window();

        loop {
            if cancel.is_cancelled() {
                return CycleOutcome::Cancelled;
            }
            let now = self.clock.now();
            if now >= deadline {
                info!("no command received, returning to wake word detection");
                return CycleOutcome::TimedOut;
            }

            let timeout = self.config.listen_timeout().min(deadline - now);
            if let RecognitionResult::Recognized(text) = self.voice.listen_once(timeout) {
                let utterance = text.trim();
                if !utterance.is_empty() {
                    info!("You: {utterance}");
                    let turn = self.respond(utterance);
                    self.clock.sleep(self.config.settle());
                    return CycleOutcome::Replied(turn);
                }
            }
            self.clock.sleep(self.config.retry_interval());
        }
    }

    /// Think, then speak the reply or the fallback.
    fn respond(&mut self, utterance: &str) -> ConversationTurn {
        self.transition(AssistantState::Thinking);
        let mut turn = ConversationTurn::new(utterance);

        let reply = match turn.respond(self.memory.as_ref(), &self.generator, self.memory_limit) {
            Ok(reply) => reply.to_owned(),
            Err(e) => {
                warn!("reply generation failed: {e}");
                let fallback = self.config.fallback_reply.trim();
                if fallback.is_empty() {
                    return turn;
                }
                turn.reply = Some(fallback.to_owned());
                fallback.to_owned()
            }
        };

        self.transition(AssistantState::Speaking);
        self.voice.speak(&reply);
        turn
    }

    /// Publish `off` and release the status channel.
    pub fn shutdown(&mut self) {
        info!("shutting down");
        self.transition(AssistantState::Idle);
        self.status.shutdown();
    }
}
