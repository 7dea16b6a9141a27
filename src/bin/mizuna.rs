//! CLI binary for mizuna.

use clap::{Parser, Subcommand};
use mizuna::clock::SystemClock;
use mizuna::config::{AssistantConfig, LlmConfig, MemoryConfig, SpeechConfig};
use mizuna::led::LedStatusChannel;
use mizuna::llm::{ChatCompletionsClient, LanguageModel, ResponseGenerator, UnavailableModel};
use mizuna::memory::{DisabledMemoryStore, MemoryStore, MongoMemoryStore};
use mizuna::voice::audio::{Microphone, Speaker};
use mizuna::voice::{
    AzureRecognizer, AzureSpeech, AzureSynthesizer, SpeechSynthesizer, SynthesisResult, VoiceIo,
};
use mizuna::{ConversationTurn, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Mizuna: wake-word voice assistant with conversation memory and LED status.
#[derive(Parser)]
#[command(name = "mizuna", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Listen for the wake phrase and hold conversations (default).
    Run,

    /// Answer one question through the same context and model path.
    Ask {
        /// The question.
        #[arg(required = true)]
        text: Vec<String>,

        /// Also speak the reply.
        #[arg(long)]
        speak: bool,
    },

    /// List available audio devices.
    Devices,

    /// Delete every remembered conversation.
    ClearMemory,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mizuna=info,mongodb=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = AssistantConfig::load(cli.config.as_deref())?;

    // The memory driver and HTTP clients block, so everything except device
    // listing runs off the async workers.
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Ask { text, speak } => {
            let text = text.join(" ");
            tokio::task::spawn_blocking(move || ask(&config, &text, speak)).await?
        }
        Command::Devices => list_devices(),
        Command::ClearMemory => {
            tokio::task::spawn_blocking(move || clear_memory(&config.memory)).await?
        }
    }
}

async fn run(config: AssistantConfig) -> anyhow::Result<()> {
    println!("Mizuna v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let voice = voice_io(&config.speech)?;
        let mut orchestrator = Orchestrator::new(
            &config,
            voice,
            memory_store(&config.memory),
            response_generator(&config.llm),
            Box::new(LedStatusChannel::from_config(&config.led)),
            Arc::new(SystemClock::default()),
        );

        println!(
            "\nListening for wake words: {}. Press Ctrl+C to quit.\n",
            config.wake.phrases.join(", ")
        );
        orchestrator.run(&cancel);
        Ok(())
    })
    .await?
}

fn ask(config: &AssistantConfig, text: &str, speak: bool) -> anyhow::Result<()> {
    let memory = memory_store(&config.memory);
    let generator = response_generator(&config.llm);

    let mut turn = ConversationTurn::new(text);
    let reply = turn
        .respond(memory.as_ref(), &generator, config.memory.recent_limit)?
        .to_owned();
    println!("{reply}");

    if speak {
        let speech = AzureSpeech::new(&config.speech)?;
        let mut synthesizer =
            AzureSynthesizer::new(speech, Speaker::new(config.speech.output_device.clone()));
        if let SynthesisResult::Canceled(reason) = synthesizer.synthesize(&reply) {
            warn!("speech synthesis canceled: {reason}");
        }
    }
    Ok(())
}

fn clear_memory(config: &MemoryConfig) -> anyhow::Result<()> {
    let store = MongoMemoryStore::connect(config)?;
    let deleted = store.clear()?;
    println!("Deleted {deleted} remembered conversation(s).");
    Ok(())
}

fn list_devices() -> anyhow::Result<()> {
    println!("Input devices:");
    for name in Microphone::list_input_devices()? {
        println!("  - {name}");
    }

    println!("\nOutput devices:");
    for name in Speaker::list_output_devices()? {
        println!("  - {name}");
    }

    Ok(())
}

fn voice_io(config: &SpeechConfig) -> anyhow::Result<VoiceIo> {
    let speech = AzureSpeech::new(config)?;
    let microphone = Microphone::new(
        config.input_device.clone(),
        config.sample_rate,
        config.vad_threshold,
        Duration::from_millis(config.end_silence_ms),
    )?;
    let speaker = Speaker::new(config.output_device.clone());
    Ok(VoiceIo::new(
        Box::new(AzureRecognizer::new(speech.clone(), microphone)),
        Box::new(AzureSynthesizer::new(speech, speaker)),
    ))
}

fn memory_store(config: &MemoryConfig) -> Box<dyn MemoryStore> {
    match MongoMemoryStore::connect(config) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("{e}; continuing without conversation memory");
            Box::new(DisabledMemoryStore::new(e.to_string()))
        }
    }
}

fn response_generator(config: &LlmConfig) -> ResponseGenerator {
    let model: Box<dyn LanguageModel> = match ChatCompletionsClient::new(config) {
        Ok(client) => Box::new(client),
        Err(e) => {
            warn!("{e}; replies will use the fallback");
            Box::new(UnavailableModel::new(e.to_string()))
        }
    };
    ResponseGenerator::new(model, config.persona.clone())
}
