//! Message types that flow between pipeline stages.

use std::time::{Instant, SystemTime};

/// A block of raw samples delivered by the capture device.
#[derive(Debug, Clone)]
pub struct SampleBlock {
    /// Sequence number for ordering blocks.
    pub sequence: u64,
    /// Timestamp when the audio was captured.
    pub timestamp: Instant,
    /// Audio samples as 16-bit PCM, mono.
    pub samples: Vec<i16>,
}

impl SampleBlock {
    /// Creates a new sample block stamped with the current time.
    pub fn new(sequence: u64, samples: Vec<i16>) -> Self {
        Self {
            sequence,
            timestamp: Instant::now(),
            samples,
        }
    }

    /// Mean absolute amplitude normalized to [0, 1], for level meters.
    pub fn level(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: u64 = self
            .samples
            .iter()
            .map(|&s| (s as i32).unsigned_abs() as u64)
            .sum();
        (sum as f32 / self.samples.len() as f32) / 32768.0
    }
}

/// An overlap-prefixed span of audio ready for transcription.
///
/// Ownership moves through the chunk queue to the dispatcher; chunks are
/// immutable once constructed.
#[derive(Debug, Clone)]
pub struct TranscriptionChunk {
    /// Monotonic chunk identifier within a session.
    pub chunk_id: u64,
    /// Overlap tail from the previous chunk followed by newly drained audio.
    pub samples: Vec<i16>,
}

impl TranscriptionChunk {
    /// Returns the duration of this chunk in milliseconds.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        (self.samples.len() as u64 * 1000 / sample_rate as u64) as u32
    }
}

/// One transcribed subtitle line.
#[derive(Debug, Clone)]
pub struct TranscriptEvent {
    pub text: String,
    pub timestamp: SystemTime,
}

impl TranscriptEvent {
    pub fn new(text: String) -> Self {
        Self {
            text,
            timestamp: SystemTime::now(),
        }
    }
}

/// Pipeline lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Recording,
}

/// Events delivered to the presentation consumer.
#[derive(Debug, Clone)]
pub enum SubtitleEvent {
    /// A new subtitle line.
    Transcript(TranscriptEvent),
    /// Audio level of the latest sample block, in [0, 1].
    Level(f32),
    /// The pipeline changed state.
    State(PipelineState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_block_level_of_silence_is_zero() {
        let block = SampleBlock::new(0, vec![0i16; 1024]);
        assert_eq!(block.level(), 0.0);
    }

    #[test]
    fn sample_block_level_of_full_scale_is_one() {
        let block = SampleBlock::new(0, vec![i16::MIN; 1024]);
        assert!((block.level() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn sample_block_level_of_empty_block() {
        let block = SampleBlock::new(0, Vec::new());
        assert_eq!(block.level(), 0.0);
    }

    #[test]
    fn chunk_duration() {
        let chunk = TranscriptionChunk {
            chunk_id: 1,
            samples: vec![0i16; 64000],
        };
        assert_eq!(chunk.duration_ms(16000), 4000);
    }

    #[test]
    fn transcript_event_carries_text() {
        let event = TranscriptEvent::new("hello".to_string());
        assert_eq!(event.text, "hello");
        assert!(event.timestamp <= SystemTime::now());
    }
}
