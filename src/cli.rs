//! Command-line interface for livesub
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live microphone subtitles via streaming cloud transcription
#[derive(Parser, Debug)]
#[command(
    name = "livesub",
    version,
    about = "Live microphone subtitles via streaming cloud transcription"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress everything except the subtitles themselves
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: level meter, -vv: per-chunk diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device (e.g., pipewire)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Language code for transcription (default: auto-detect). Examples: auto, en, ja
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Transcription model name
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Topic hint embedded in the first transcription request
    #[arg(long, value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Chunk duration in seconds
    #[arg(long, value_name = "SECONDS")]
    pub chunk_secs: Option<f32>,

    /// Overlap carried between chunks in seconds
    #[arg(long, value_name = "SECONDS")]
    pub overlap_secs: Option<f32>,

    /// Read the API key from a file instead of $OPENAI_API_KEY
    #[arg(long, value_name = "PATH")]
    pub api_key_file: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,
}
