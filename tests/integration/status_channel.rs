//! LED status channel: token publication and renderer cancellation.

use mizuna::AssistantState;
use mizuna::clock::{ManualClock, SystemClock};
use mizuna::config::{LedBackend, LedConfig};
use mizuna::led::{
    AnimationRenderer, FrameSink, LedStatusChannel, RenderOutcome, RendererTask, Rgb,
    StatusFile, StatusPublisher, StatusRead, StatusSource, StatusToken,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
struct CountingSink {
    frames: Arc<Mutex<Vec<Vec<Rgb>>>>,
}

impl FrameSink for CountingSink {
    fn show(&mut self, pixels: &[Rgb]) -> mizuna::Result<()> {
        self.frames.lock().expect("frames lock").push(pixels.to_vec());
        Ok(())
    }
}

/// Reads a real status file, overwriting it with `next` on poll `change_at`.
struct ChangingFile {
    file: StatusFile,
    next: StatusToken,
    change_at: usize,
    polls: usize,
}

impl StatusSource for ChangingFile {
    fn observe(&mut self) -> StatusRead {
        self.polls += 1;
        if self.polls == self.change_at {
            self.file.write(&self.next).expect("write status");
        }
        self.file.read()
    }
}

#[cfg(unix)]
#[test]
fn process_backend_writes_versioned_tokens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = StatusFile::new(dir.path().join("led_state"));
    let mut channel = LedStatusChannel::process(file.clone(), vec!["true".to_owned()]);

    channel.publish(AssistantState::Listening);
    assert_eq!(
        std::fs::read_to_string(file.path()).expect("read"),
        "listening:1"
    );

    channel.publish(AssistantState::WakeDetected);
    channel.publish(AssistantState::Conversation);
    assert_eq!(
        file.read(),
        StatusRead::Token(StatusToken::new(AssistantState::Conversation, 3))
    );
}

#[cfg(unix)]
#[test]
fn process_backend_forwards_strip_settings_to_renderer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let recorded = dir.path().join("argv");
    let script = dir.path().join("fake-led");
    std::fs::write(
        &script,
        format!(
            "printf '%s\\n' \"$@\" > \"{0}.tmp\" && mv \"{0}.tmp\" \"{0}\"\n",
            recorded.display()
        ),
    )
    .expect("write script");

    let config = LedConfig {
        backend: LedBackend::Process,
        status_file: dir.path().join("led_state"),
        renderer_command: vec!["sh".to_owned(), script.display().to_string()],
        device: Some("/dev/custom-strip".into()),
        led_count: 30,
        brightness: 0.25,
        repeat: true,
        ..LedConfig::default()
    };
    let mut channel = LedStatusChannel::from_config(&config);
    channel.publish(AssistantState::Listening);

    let deadline = Instant::now() + Duration::from_secs(5);
    let argv = loop {
        if let Ok(argv) = std::fs::read_to_string(&recorded) {
            break argv;
        }
        assert!(Instant::now() < deadline, "renderer never ran");
        std::thread::sleep(Duration::from_millis(10));
    };
    let args: Vec<&str> = argv.lines().collect();

    assert_eq!(&args[..4], ["set", "listening", "--generation", "1"]);
    let value_after = |flag: &str| {
        args.iter()
            .position(|a| *a == flag)
            .and_then(|i| args.get(i + 1).copied())
    };
    assert_eq!(value_after("--device"), Some("/dev/custom-strip"));
    assert_eq!(value_after("--led-count"), Some("30"));
    assert_eq!(value_after("--brightness"), Some("0.25"));
    assert_eq!(
        value_after("--status-file"),
        Some(config.status_file.to_str().expect("utf-8 path"))
    );
    assert!(args.contains(&"--repeat"));
}

#[test]
fn repeated_publish_leaves_token_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = StatusFile::new(dir.path().join("led_state"));
    // Unspawnable renderer: publication must still succeed.
    let mut channel =
        LedStatusChannel::process(file.clone(), vec!["/nonexistent/mizuna-led".to_owned()]);

    channel.publish(AssistantState::Thinking);
    let first = std::fs::read_to_string(file.path()).expect("read");
    for _ in 0..5 {
        channel.publish(AssistantState::Thinking);
    }
    assert_eq!(std::fs::read_to_string(file.path()).expect("read"), first);
    assert_eq!(first, "thinking:1");
}

#[test]
fn file_renderer_stops_within_one_poll_of_a_change() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = StatusFile::new(dir.path().join("led_state"));
    let own = StatusToken::new(AssistantState::Speaking, 4);
    file.write(&own).expect("write status");

    let sink = CountingSink::default();
    let mut renderer =
        AnimationRenderer::new(Box::new(sink.clone()), 32, Arc::new(ManualClock::new()));
    let mut source = ChangingFile {
        file,
        next: StatusToken::new(AssistantState::Idle, 5),
        change_at: 10,
        polls: 0,
    };

    let outcome = renderer.run(&own, &mut source, true).expect("render");
    assert_eq!(outcome, RenderOutcome::Superseded);
    assert_eq!(source.polls, 10);
    assert_eq!(sink.frames.lock().expect("frames lock").len(), 9);
}

#[test]
fn renderer_keeps_drawing_when_status_file_is_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut file = StatusFile::new(dir.path().join("never_written"));
    let sink = CountingSink::default();
    let mut renderer =
        AnimationRenderer::new(Box::new(sink.clone()), 16, Arc::new(ManualClock::new()));

    let own = StatusToken::new(AssistantState::Listening, 1);
    let outcome = renderer.run(&own, &mut file, false).expect("render");
    assert_eq!(outcome, RenderOutcome::Completed);
    assert!(!sink.frames.lock().expect("frames lock").is_empty());
}

#[test]
fn in_process_channel_goes_dark_on_shutdown() {
    let sink = CountingSink::default();
    let renderer =
        AnimationRenderer::new(Box::new(sink.clone()), 12, Arc::new(SystemClock::default()));
    let task = RendererTask::spawn(renderer, Duration::from_millis(5)).expect("spawn renderer");
    let mut channel = LedStatusChannel::in_process(task);

    channel.publish(AssistantState::Conversation);
    let deadline = Instant::now() + Duration::from_secs(2);
    while sink.frames.lock().expect("frames lock").len() < 3 {
        assert!(Instant::now() < deadline, "renderer never drew");
        std::thread::sleep(Duration::from_millis(5));
    }

    channel.publish(AssistantState::Idle);
    channel.shutdown();
    let frames = sink.frames.lock().expect("frames lock");
    assert_eq!(frames.last().expect("a frame"), &vec![Rgb::OFF; 12]);
    assert_eq!(
        channel.current(),
        Some(StatusToken::new(AssistantState::Idle, 2))
    );
}
