//! Default configuration constants for livesub.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and request size for streaming transcription.
pub const SAMPLE_RATE: u32 = 16000;

/// Number of audio channels (mono).
pub const CHANNELS: u16 = 1;

/// Default chunk duration in seconds.
///
/// Each chunk becomes one transcription request. 4 seconds bounds per-request
/// latency while giving the model enough acoustic context to work with.
pub const CHUNK_DURATION_SECS: f32 = 4.0;

/// Default overlap duration in seconds.
///
/// The tail of each chunk is prepended to the next one so words spoken across
/// a chunk boundary are not truncated from the audio sent to the model.
pub const OVERLAP_DURATION_SECS: f32 = 0.8;

/// Default number of past transcriptions kept as rolling context.
///
/// Recent transcript text is attached to each request as a prompt, which
/// improves continuity and disambiguates homophones across chunk boundaries.
/// Bounding it caps prompt growth.
pub const CONTEXT_HISTORY: usize = 4;

/// Default language code for transcription.
///
/// "auto" omits the language field so the service detects it.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default transcription model name.
pub const DEFAULT_MODEL: &str = "gpt-4o-transcribe";

/// Default transcription API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Hard timeout for a single transcription request in seconds.
pub const API_TIMEOUT_SECS: u64 = 10;

/// Queue-read timeout for pipeline workers in milliseconds.
///
/// Workers block on their inbound queue for at most this long per iteration
/// so they observe a stop signal promptly.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Polling interval for the capture reader thread when no samples are
/// available, in milliseconds.
pub const CAPTURE_POLL_MS: u64 = 10;

/// Buffer size of the raw sample-block queue (capture thread → assembler).
pub const RAW_QUEUE_SIZE: usize = 1000;

/// Buffer size of the chunk queue (assembler → dispatcher).
pub const CHUNK_QUEUE_SIZE: usize = 100;

/// Buffer size of the event queue (pipeline → presentation).
pub const EVENT_QUEUE_SIZE: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_shorter_than_chunk() {
        assert!(OVERLAP_DURATION_SECS < CHUNK_DURATION_SECS);
    }

    #[test]
    fn worked_example_sample_counts() {
        // 4.0s at 16kHz = 64000 samples, 0.8s = 12800 samples
        assert_eq!((SAMPLE_RATE as f32 * CHUNK_DURATION_SECS) as usize, 64000);
        assert_eq!((SAMPLE_RATE as f32 * OVERLAP_DURATION_SECS) as usize, 12800);
    }
}
