//! Configuration files drive orchestrator behaviour.

use crate::helpers::{Heard, Memory, Model, harness_with};
use mizuna::clock::Clock;
use mizuna::config::{AssistantConfig, LedBackend};
use mizuna::led::{LedStatusChannel, StatusPublisher};
use mizuna::{AssistantState, CycleOutcome};
use std::time::Duration;

fn load(toml: &str) -> AssistantConfig {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, toml).expect("write config");
    AssistantConfig::from_file(&path).expect("load config")
}

#[test]
fn custom_wake_phrase_and_window_from_file() {
    let mut config = load(
        r#"
[wake]
phrases = ["jarvis"]

[conversation]
turn_window_s = 5
startup_sequence = false
"#,
    );
    config.llm.persona = "persona".to_owned();

    let mut h = harness_with(
        config,
        vec![
            Heard::Say("hey mizuna"),
            Heard::Say("Jarvis, are you there?"),
            Heard::Silence,
        ],
        Memory::Records(vec![]),
        Model::Reply("unused"),
    );

    assert_eq!(
        h.orchestrator.run_cycle(&h.cancel.clone()),
        CycleOutcome::TimedOut
    );
    // Two utterances, then the five second window and the settle delay.
    assert!(h.clock.now() >= Duration::from_secs(7));
    assert!(h.clock.now() < Duration::from_secs(9));
}

#[test]
fn disabled_backend_from_file_accepts_publications() {
    let config = load("[led]\nbackend = \"disabled\"\n");
    assert_eq!(config.led.backend, LedBackend::Disabled);

    let mut channel = LedStatusChannel::from_config(&config.led);
    channel.publish(AssistantState::Listening);
    channel.publish(AssistantState::Idle);
    channel.shutdown();
    assert_eq!(
        channel.current().map(|t| (t.state, t.generation)),
        Some((AssistantState::Idle, Some(2)))
    );
}
