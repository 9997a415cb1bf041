use anyhow::{Context, Result};
use clap::Parser;
use livesub::audio::capture::{CpalAudioSource, list_devices};
use livesub::cli::{Cli, Commands};
use livesub::config::{Config, default_config_path};
use livesub::pipeline::{CoordinatorConfig, PipelineCoordinator, PipelineState, SubtitleEvent};
use livesub::stt::remote::RemoteTranscriber;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Some(Commands::Devices) => {
            for name in list_devices()? {
                println!("{}", name);
            }
            Ok(())
        }
        None => run_session(cli).await,
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("livesub={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&default_config_path())?,
    };

    if let Some(device) = &cli.device {
        config.audio.device = Some(device.clone());
    }
    if let Some(language) = &cli.language {
        config.transcription.language = language.clone();
    }
    if let Some(model) = &cli.model {
        config.transcription.model = model.clone();
    }
    if let Some(secs) = cli.chunk_secs {
        config.chunking.chunk_duration_secs = secs;
    }
    if let Some(secs) = cli.overlap_secs {
        config.chunking.overlap_duration_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_api_key(cli: &Cli) -> Result<String> {
    if let Some(path) = &cli.api_key_file {
        return Ok(RemoteTranscriber::load_api_key(path)?);
    }
    std::env::var("OPENAI_API_KEY")
        .context("no API key: set OPENAI_API_KEY or pass --api-key-file")
}

async fn run_session(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let api_key = resolve_api_key(&cli)?;

    let transcriber = Arc::new(RemoteTranscriber::new(&config.transcription, api_key)?);
    let source = CpalAudioSource::new(config.audio.device.as_deref())?;

    let mut coordinator = PipelineCoordinator::new(CoordinatorConfig::from_config(&config));
    let mut events = coordinator.start(source, transcriber, cli.topic.as_deref())?;

    if !cli.quiet {
        eprintln!("Listening (language: {}). Ctrl-C to stop.", config.transcription.language);
    }

    let session_start = Instant::now();
    let show_meter = cli.verbose >= 1 && !cli.quiet;
    let show_stats = cli.verbose >= 2 && !cli.quiet;

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(SubtitleEvent::Transcript(transcript)) => {
                        if show_meter {
                            // Clear the meter line before printing the subtitle
                            eprint!("\r{:40}\r", "");
                        }
                        let elapsed = session_start.elapsed().as_secs();
                        println!("[{:02}:{:02}] {}", elapsed / 60, elapsed % 60, transcript.text);
                        if show_stats {
                            let stats = coordinator.metrics();
                            eprintln!(
                                "  ({} ms, prompt {} chars, backlog {:.1}s)",
                                stats.last_latency_ms,
                                stats.last_prompt_chars,
                                stats.buffered_secs(config.audio.sample_rate),
                            );
                        }
                    }
                    Some(SubtitleEvent::Level(level)) => {
                        if show_meter {
                            let bars = (level * 40.0).round() as usize;
                            eprint!("\r[{:<20}]", "#".repeat(bars.min(20)));
                            let _ = std::io::stderr().flush();
                        }
                    }
                    Some(SubtitleEvent::State(PipelineState::Idle)) | None => break,
                    Some(SubtitleEvent::State(PipelineState::Recording)) => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                coordinator.stop();
            }
        }
    }

    if !cli.quiet {
        let stats = coordinator.metrics();
        eprintln!(
            "\n{} chunks transcribed, {} failed",
            stats.chunks_transcribed, stats.chunks_failed
        );
    }
    Ok(())
}
