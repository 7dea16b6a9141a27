//! End-to-end behaviour of the wake → conversation → response loop.

use crate::helpers::{Heard, Memory, Model, harness, harness_with, test_config};
use mizuna::clock::Clock;
use mizuna::llm::{ChatMessage, MEMORY_PREAMBLE, Role};
use mizuna::memory::MemoryRecord;
use mizuna::{AssistantState, CycleOutcome};
use std::sync::atomic::Ordering;
use std::time::Duration;

use AssistantState::{Conversation, Idle, Listening, Speaking, Thinking, WakeDetected};

#[test]
fn wake_phrase_publishes_listening_wake_conversation_in_order() {
    let mut h = harness(
        vec![Heard::Say("hey mizuna")],
        Memory::Records(vec![]),
        Model::Reply("Hi!"),
    );

    assert_eq!(h.orchestrator.run_cycle(&h.cancel.clone()), CycleOutcome::Cancelled);
    assert_eq!(h.published(), vec![Listening, WakeDetected, Conversation]);
}

#[test]
fn turn_window_closes_after_fifteen_seconds_without_generation() {
    let mut h = harness(
        vec![Heard::Say("Hey Mizuna."), Heard::Silence, Heard::Silence, Heard::Silence],
        Memory::Records(vec![]),
        Model::Reply("unused"),
    );

    let outcome = h.orchestrator.run_cycle(&h.cancel.clone());
    assert_eq!(outcome, CycleOutcome::TimedOut);
    assert!(h.requests().is_empty());
    assert!(h.spoken().is_empty());
    assert_eq!(h.published(), vec![Listening, WakeDetected, Conversation, Idle]);
    // 1s to hear the wake phrase, then the whole window.
    assert!(h.clock.now() >= Duration::from_secs(16));
}

#[test]
fn timed_out_turn_returns_to_listening() {
    let mut h = harness(
        vec![Heard::Say("computer"), Heard::Silence, Heard::Silence],
        Memory::Records(vec![]),
        Model::Reply("unused"),
    );

    h.orchestrator.run(&h.cancel.clone());
    assert_eq!(
        h.published(),
        vec![Idle, Listening, WakeDetected, Conversation, Idle, Listening, Idle]
    );
    assert_eq!(h.shutdowns.load(Ordering::SeqCst), 1);
    assert!(h.requests().is_empty());
}

#[test]
fn short_acknowledgement_gets_persona_only_request() {
    let mut h = harness(
        vec![Heard::Say("hey mizuna"), Heard::Say("ok")],
        Memory::Records(vec![]),
        Model::Reply("Great!"),
    );

    match h.orchestrator.run_cycle(&h.cancel.clone()) {
        CycleOutcome::Replied(turn) => {
            assert!(!turn.load_context);
            assert_eq!(turn.reply.as_deref(), Some("Great!"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let requests = h.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        vec![ChatMessage::system("persona"), ChatMessage::user("ok")]
    );
    assert_eq!(h.spoken(), vec!["Great!".to_owned()]);
    assert_eq!(
        h.published(),
        vec![Listening, WakeDetected, Conversation, Thinking, Speaking, Idle]
    );
}

#[test]
fn memory_question_includes_recent_summaries() {
    let records = vec![
        MemoryRecord::new("Rover", "Built a rover", "Two DC motors"),
        MemoryRecord::new("Garden", "Planned beds", ""),
    ];
    let mut h = harness(
        vec![
            Heard::Say("hey mizuna"),
            Heard::Say("what did I tell you about my project"),
        ],
        Memory::Records(records),
        Model::Reply("Your rover!"),
    );

    assert!(matches!(
        h.orchestrator.run_cycle(&h.cancel.clone()),
        CycleOutcome::Replied(_)
    ));
    assert_eq!(h.memory_calls.load(Ordering::SeqCst), 1);

    let request = &h.requests()[0];
    assert_eq!(request.len(), 3);
    assert_eq!(request[1].role, Role::System);
    assert!(request[1].content.starts_with(MEMORY_PREAMBLE));
    assert!(request[1].content.contains("Previously discussed: Rover. Built a rover"));
    assert_eq!(request[2], ChatMessage::user("what did I tell you about my project"));
}

#[test]
fn memory_outage_yields_empty_context() {
    let mut h = harness(
        vec![Heard::Say("hey mizuna"), Heard::Say("remember my robot project")],
        Memory::Down,
        Model::Reply("Tell me more."),
    );

    match h.orchestrator.run_cycle(&h.cancel.clone()) {
        CycleOutcome::Replied(turn) => {
            assert!(turn.load_context);
            assert_eq!(turn.memory_context, None);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(h.memory_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.requests()[0].len(), 2);
    assert_eq!(h.spoken(), vec!["Tell me more.".to_owned()]);
}

#[test]
fn unavailable_model_speaks_the_fallback() {
    let mut h = harness(
        vec![Heard::Say("hey mizuna"), Heard::Say("tell me a joke")],
        Memory::Records(vec![]),
        Model::Down,
    );

    match h.orchestrator.run_cycle(&h.cancel.clone()) {
        CycleOutcome::Replied(turn) => {
            assert_eq!(
                turn.reply.as_deref(),
                Some("Sorry, I can't think of an answer right now.")
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        h.spoken(),
        vec!["Sorry, I can't think of an answer right now.".to_owned()]
    );
    assert!(h.published().contains(&Speaking));
}

#[test]
fn empty_fallback_skips_speech() {
    let mut config = test_config();
    config.conversation.fallback_reply = String::new();
    let mut h = harness_with(
        config,
        vec![Heard::Say("hey mizuna"), Heard::Say("tell me a joke")],
        Memory::Records(vec![]),
        Model::Down,
    );

    match h.orchestrator.run_cycle(&h.cancel.clone()) {
        CycleOutcome::Replied(turn) => assert_eq!(turn.reply, None),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(h.spoken().is_empty());
    assert_eq!(
        h.published(),
        vec![Listening, WakeDetected, Conversation, Thinking, Idle]
    );
}

#[test]
fn recognition_failures_keep_listening() {
    let mut h = harness(
        vec![
            Heard::Fail,
            Heard::Say("nice weather"),
            Heard::Silence,
            Heard::Say("Computer!"),
            Heard::Fail,
            Heard::Say("what time is it"),
        ],
        Memory::Records(vec![]),
        Model::Reply("Noon."),
    );

    match h.orchestrator.run_cycle(&h.cancel.clone()) {
        CycleOutcome::Replied(turn) => assert_eq!(turn.utterance, "what time is it"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    // Listening is published once, not per attempt.
    assert_eq!(
        h.published().iter().filter(|s| **s == Listening).count(),
        1
    );
}

#[test]
fn startup_sequence_cycles_all_patterns() {
    let mut config = test_config();
    config.conversation.startup_sequence = true;
    let mut h = harness_with(config, vec![], Memory::Records(vec![]), Model::Reply(""));

    h.orchestrator.run(&h.cancel.clone());
    assert_eq!(
        h.published(),
        vec![
            Idle,
            Listening,
            WakeDetected,
            Conversation,
            Thinking,
            Speaking,
            Idle,
            Listening,
            Idle
        ]
    );
}
