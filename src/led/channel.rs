//! The orchestrator's side of the LED status channel.

use super::file::StatusFile;
use super::renderer::AnimationRenderer;
use super::sink::{NullSink, open_sink};
use super::task::RendererTask;
use super::token::StatusToken;
use crate::clock::SystemClock;
use crate::config::{LedBackend, LedConfig};
use crate::error::AssistantError;
use crate::state::AssistantState;
use std::ffi::OsString;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Receives every state transition. Must never block or fail the caller.
pub trait StatusPublisher: Send {
    /// Make `state` the current status.
    fn publish(&mut self, state: AssistantState);

    /// Release renderer resources. Called once after the final `Idle`.
    fn shutdown(&mut self) {}
}

enum Backend {
    InProcess(RendererTask),
    Process {
        file: StatusFile,
        command: Vec<String>,
        settings: LedConfig,
    },
    Disabled,
}

/// Publishes assistant states as generation-stamped status tokens.
///
/// The generation advances only when the state changes, so repeating a
/// publication leaves the token untouched and starts no new renderer.
pub struct LedStatusChannel {
    backend: Backend,
    current: Option<StatusToken>,
    generation: u64,
}

impl LedStatusChannel {
    /// Publish into a long-lived renderer thread.
    pub fn in_process(task: RendererTask) -> Self {
        Self::with_backend(Backend::InProcess(task))
    }

    /// Publish through `file`, launching `command set <state> ...` per
    /// publication with default strip settings.
    pub fn process(file: StatusFile, command: Vec<String>) -> Self {
        Self::process_with(file, command, LedConfig::default())
    }

    /// Like [`process`](Self::process), forwarding the device, strip size,
    /// brightness and repeat flag in `settings` to every renderer.
    pub fn process_with(file: StatusFile, command: Vec<String>, settings: LedConfig) -> Self {
        Self::with_backend(Backend::Process {
            file,
            command,
            settings,
        })
    }

    /// Accept publications and do nothing with them.
    pub fn disabled() -> Self {
        Self::with_backend(Backend::Disabled)
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            current: None,
            generation: 0,
        }
    }

    /// Build the configured backend. Problems degrade, never fail: an
    /// unopenable device renders into nothing, an unspawnable renderer
    /// thread disables LEDs.
    pub fn from_config(config: &LedConfig) -> Self {
        match config.backend {
            LedBackend::Disabled => Self::disabled(),
            LedBackend::Process => Self::process_with(
                StatusFile::new(&config.status_file),
                config.renderer_command.clone(),
                config.clone(),
            ),
            LedBackend::InProcess => {
                let sink = open_sink(config).unwrap_or_else(|e| {
                    warn!("{e}; LED frames will be discarded");
                    Box::new(NullSink)
                });
                let renderer =
                    AnimationRenderer::new(sink, config.led_count, Arc::new(SystemClock::default()));
                match RendererTask::spawn(renderer, config.frame_interval()) {
                    Ok(task) => Self::in_process(task),
                    Err(e) => {
                        warn!("{e}; LED status disabled");
                        Self::disabled()
                    }
                }
            }
        }
    }

    /// Last token published, if any.
    #[must_use]
    pub fn current(&self) -> Option<StatusToken> {
        self.current
    }

    fn next_token(&mut self, state: AssistantState) -> Option<StatusToken> {
        if self.current.is_some_and(|t| t.state == state) {
            return None;
        }
        self.generation += 1;
        let token = StatusToken::new(state, self.generation);
        self.current = Some(token);
        Some(token)
    }
}

impl StatusPublisher for LedStatusChannel {
    fn publish(&mut self, state: AssistantState) {
        let Some(token) = self.next_token(state) else {
            debug!(state = %state, "status unchanged");
            return;
        };
        debug!(token = %token, "publishing status");

        match &self.backend {
            Backend::InProcess(task) => task.send(token),
            Backend::Process {
                file,
                command,
                settings,
            } => {
                if let Err(e) = file.write(&token) {
                    warn!("{e}");
                }
                if let Err(e) = spawn_renderer(command, &renderer_args(settings, file, &token)) {
                    warn!("{e}");
                }
            }
            Backend::Disabled => {}
        }
    }

    fn shutdown(&mut self) {
        if let Backend::InProcess(task) = &mut self.backend {
            task.stop();
        }
    }
}

/// Arguments after the renderer command: the `set` verb for `token`,
/// then every strip setting the child cannot read from its own config.
fn renderer_args(settings: &LedConfig, file: &StatusFile, token: &StatusToken) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "set".into(),
        token.state.as_str().into(),
        "--generation".into(),
        token.generation.unwrap_or_default().to_string().into(),
        "--status-file".into(),
        file.path().into(),
        "--led-count".into(),
        settings.led_count.to_string().into(),
        "--brightness".into(),
        settings.brightness.to_string().into(),
    ];
    if let Some(device) = &settings.device {
        args.push("--device".into());
        args.push(device.into());
    }
    if settings.repeat {
        args.push("--repeat".into());
    }
    args
}

/// Launch a detached renderer and reap it in the background.
fn spawn_renderer(command: &[String], args: &[OsString]) -> Result<(), AssistantError> {
    let Some((program, leading)) = command.split_first() else {
        return Err(AssistantError::RendererSpawn(
            "renderer command is empty".to_owned(),
        ));
    };

    let mut cmd = Command::new(program);
    cmd.args(leading)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| AssistantError::RendererSpawn(format!("{program}: {e}")))?;
    let pid = child.id();

    let reaper = std::thread::Builder::new()
        .name("mizuna-led-reaper".to_owned())
        .spawn(move || match child.wait() {
            Ok(status) if status.success() => debug!(pid, "renderer exited"),
            Ok(status) => info!(pid, %status, "renderer exited with failure"),
            Err(e) => warn!(pid, "renderer wait failed: {e}"),
        });
    if let Err(e) = reaper {
        warn!(pid, "cannot reap renderer: {e}");
    }
    Ok(())
}
