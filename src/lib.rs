//! livesub - live microphone subtitles via streaming cloud transcription
//!
//! Captures audio from the default input device, segments it into
//! overlapping chunks, transcribes each chunk through a remote
//! speech-to-text API with a rolling context prompt, and delivers the
//! results as a stream of subtitle events.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod stt;

// Core traits (source → pipeline → service)
pub use audio::source::AudioSource;
pub use stt::service::TranscriptionService;

// Pipeline
pub use pipeline::coordinator::{CoordinatorConfig, PipelineCoordinator};
pub use pipeline::frame::{PipelineState, SubtitleEvent, TranscriptEvent};

// Error handling
pub use error::{LivesubError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
