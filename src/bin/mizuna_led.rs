//! Detached LED renderer for mizuna.
//!
//! Launched once per status change when the strip needs elevated
//! privileges. Exits when its pattern finishes or the status file moves on.

use clap::{Parser, Subcommand};
use mizuna::clock::SystemClock;
use mizuna::config::AssistantConfig;
use mizuna::led::{AnimationRenderer, Rgb, StatusFile, StatusToken, open_sink};
use mizuna::state::AssistantState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Length of a `pulse`.
const PULSE_DURATION: Duration = Duration::from_secs(1);

/// Render mizuna status patterns on an LED strip.
#[derive(Parser)]
#[command(name = "mizuna-led", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Pixel device (overrides config).
    #[arg(long, global = true)]
    device: Option<PathBuf>,

    /// Number of pixels on the strip (overrides config).
    #[arg(long, global = true)]
    led_count: Option<usize>,

    /// Global brightness 0.0-1.0 (overrides config).
    #[arg(long, global = true)]
    brightness: Option<f32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a state's pattern; unknown states clear the strip.
    Set {
        /// State name (off, listening, wake_detected, conversation,
        /// thinking, speaking).
        state: String,

        /// Generation assigned by the publisher. Without it the token is
        /// written to the status file first.
        #[arg(long)]
        generation: Option<u64>,

        /// Status file to poll (overrides config).
        #[arg(long)]
        status_file: Option<PathBuf>,

        /// Loop until superseded instead of playing once.
        #[arg(long)]
        repeat: bool,
    },

    /// Pulse the whole strip in one colour.
    Pulse { r: u8, g: u8, b: u8 },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mizuna=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut led = AssistantConfig::load(cli.config.as_deref())?.led;
    if let Some(device) = cli.device {
        led.device = Some(device);
    }
    if let Some(led_count) = cli.led_count {
        led.led_count = led_count;
    }
    if let Some(brightness) = cli.brightness {
        led.brightness = brightness;
    }

    let sink = open_sink(&led)?;
    let mut renderer = AnimationRenderer::new(sink, led.led_count, Arc::new(SystemClock::default()));

    match cli.command {
        Command::Set {
            state,
            generation,
            status_file,
            repeat,
        } => {
            let mut file = StatusFile::new(status_file.unwrap_or(led.status_file));
            let Some(state) = AssistantState::from_token(&state) else {
                warn!("unknown state {state:?}, clearing strip");
                renderer.clear()?;
                return Ok(());
            };

            let own = match generation {
                Some(generation) => StatusToken::new(state, generation),
                None => {
                    let token = StatusToken::bare(state);
                    file.write(&token)?;
                    token
                }
            };
            let outcome = renderer.run(&own, &mut file, repeat || led.repeat)?;
            info!(token = %own, ?outcome, "renderer finished");
        }
        Command::Pulse { r, g, b } => {
            renderer.pulse(Rgb::new(r, g, b), PULSE_DURATION)?;
        }
    }
    Ok(())
}
